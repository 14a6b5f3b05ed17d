use anyhow::{Context, Result};
use bill_core::{BillReport, MomentumLevel, Stage};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

pub struct VaultPaths {
    pub root: PathBuf,
    pub index_dir: PathBuf,
    pub bills_dir: PathBuf,
}

impl VaultPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            index_dir: root.join("00_Index"),
            bills_dir: root.join("Bills"),
            root,
        }
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.index_dir)?;
        fs::create_dir_all(&self.bills_dir)?;
        Ok(())
    }
}

const GENERATED_NOTICE: &str = "This index is generated. Do not edit manually.";

pub fn build_notes(reports: &[BillReport], vault_root: &Path, generated_at: OffsetDateTime) -> Result<()> {
    let paths = VaultPaths::new(vault_root);
    paths.ensure()?;
    let stamp = generated_at.format(&Rfc3339)?;

    // 1) Bill notes + bill MOC
    let mut index_lines = index_header("MOC - Bills", &stamp);
    let mut sorted: Vec<&BillReport> = reports.iter().collect();
    sorted.sort_by(|a, b| {
        b.progress
            .stage
            .cmp(&a.progress.stage)
            .then_with(|| index_title(a).cmp(&index_title(b)))
    });
    for report in &sorted {
        let slug = note_slug(&report.id);
        write_bill_note(&paths, &slug, report, &stamp)?;
        index_lines.push(format!(
            "- [[Bills/{slug}|{}]] ({}, {}%)",
            index_title(report),
            report.progress.stage,
            report.progress.percentage
        ));
    }
    if sorted.is_empty() {
        index_lines.push("_No bills found._".to_string());
    }
    write_index(&paths, "MOC - Bills", &index_lines)?;

    // 2) Trending MOC
    let mut trending_lines = index_header("MOC - Trending", &stamp);
    let trending: Vec<&&BillReport> = sorted.iter().filter(|report| report.trending).collect();
    if trending.is_empty() {
        trending_lines.push("_No trending bills._".to_string());
    }
    for report in trending {
        let why = report
            .trending_signal
            .map(|signal| format!("{signal:?}"))
            .unwrap_or_default();
        trending_lines.push(format!(
            "- [[Bills/{}|{}]] ({why})",
            note_slug(&report.id),
            index_title(report)
        ));
    }
    write_index(&paths, "MOC - Trending", &trending_lines)?;

    // 3) Momentum MOC
    let mut momentum_lines = index_header("MOC - Momentum", &stamp);
    let mut level_counts: BTreeMap<String, usize> = BTreeMap::new();
    for report in reports {
        *level_counts.entry(report.momentum.level.to_string()).or_insert(0) += 1;
    }
    let mut level_counts_vec: Vec<(String, usize)> = level_counts.into_iter().collect();
    level_counts_vec.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if level_counts_vec.is_empty() {
        momentum_lines.push("_No bills found._".to_string());
    } else {
        for (level, count) in level_counts_vec {
            momentum_lines.push(format!("- {level} ({count})"));
        }
    }
    write_index(&paths, "MOC - Momentum", &momentum_lines)?;

    info!(bills = reports.len(), root = %paths.root.display(), "wrote bill notes");
    Ok(())
}

fn index_header(title: &str, stamp: &str) -> Vec<String> {
    vec![
        format!("# {title}"),
        String::new(),
        GENERATED_NOTICE.to_string(),
        format!("Generated at `{stamp}`."),
        String::new(),
    ]
}

fn write_index(paths: &VaultPaths, name: &str, lines: &[String]) -> Result<()> {
    let path = paths.index_dir.join(format!("{name}.md"));
    fs::write(&path, lines.join("\n")).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn index_title(report: &BillReport) -> String {
    match (&report.identifier, &report.title) {
        (Some(identifier), Some(title)) => format!("{identifier}: {title}"),
        (Some(identifier), None) => identifier.clone(),
        (None, Some(title)) => title.clone(),
        (None, None) => report.id.clone(),
    }
}

/// File-system safe note name derived from the bill id.
pub fn note_slug(id: &str) -> String {
    let slug: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() { "bill".to_string() } else { slug.to_string() }
}

fn write_bill_note(paths: &VaultPaths, slug: &str, report: &BillReport, stamp: &str) -> Result<()> {
    let note_path = paths.bills_dir.join(format!("{slug}.md"));
    let reasons_json = serde_json::to_string(&report.momentum.reasons)?;

    // Minimal frontmatter for later search/sorting
    let mut md = String::new();
    md.push_str("---\n");
    md.push_str(&format!("id: {}\n", serde_json::to_string(&report.id)?));
    if let Some(jurisdiction) = &report.jurisdiction {
        md.push_str(&format!("jurisdiction: {}\n", serde_json::to_string(jurisdiction)?));
    }
    md.push_str(&format!("stage: {}\n", report.progress.stage));
    md.push_str(&format!("status: {}\n", report.progress.status));
    md.push_str(&format!("momentum: {}\n", report.momentum.level));
    md.push_str(&format!("trending: {}\n", report.trending));
    md.push_str("reasons_json: |\n");
    md.push_str(&indent_yaml_block(&reasons_json));
    md.push_str(&format!("generated_at: {stamp}\n"));
    md.push_str("---\n\n");

    md.push_str(&format!("# {}\n\n", index_title(report)));

    md.push_str("## Progress\n");
    md.push_str(&format!(
        "- {} ({}%, {})\n\n",
        report.progress.description, report.progress.percentage, report.progress.status
    ));
    md.push_str("| Stage | Completed | Date |\n");
    md.push_str("| --- | --- | --- |\n");
    for stage in [Stage::Introduced, Stage::House, Stage::Senate, Stage::Enacted] {
        let record = report.progress.stages.get(stage);
        md.push_str(&format!(
            "| {stage} | {} | {} |\n",
            if record.completed { "yes" } else { "no" },
            record.date.as_deref().unwrap_or("")
        ));
    }
    md.push('\n');

    md.push_str("## Momentum\n");
    md.push_str(&format!(
        "- Level: `{}` (score {})\n",
        report.momentum.level, report.momentum.score
    ));
    if report.momentum.level != MomentumLevel::Stalled {
        for reason in &report.momentum.reasons {
            md.push_str(&format!("- {reason}\n"));
        }
    } else {
        md.push_str("- _Bill has failed or stalled._\n");
    }
    md.push('\n');

    md.push_str("## Trending\n");
    match report.trending_signal {
        Some(signal) => md.push_str(&format!("- Trending ({signal:?})\n")),
        None => md.push_str("_Not trending._\n"),
    }

    fs::write(&note_path, md).with_context(|| format!("writing {}", note_path.display()))?;
    Ok(())
}

fn indent_yaml_block(s: &str) -> String {
    let mut out = String::new();
    for line in s.lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bill_core::dates::FixedClock;
    use bill_core::schema::{Action, Jurisdiction};
    use bill_core::{Bill, Classifier};
    use time::macros::datetime;

    fn reports() -> Vec<BillReport> {
        let now = datetime!(2024-06-15 12:00 UTC);
        let classifier = Classifier::default().with_clock(FixedClock(now));
        let enacted = Bill {
            id: "ocd-bill/enacted".to_string(),
            identifier: Some("AB 1".to_string()),
            title: Some("Clean Air".to_string()),
            enacted_date: Some("2024-05-01".to_string()),
            ..Bill::default()
        };
        let busy = Bill {
            id: "ocd-bill/busy".to_string(),
            identifier: Some("SB 2".to_string()),
            actions: vec![
                Action {
                    date: "2024-06-12".to_string(),
                    description: "Hearing".to_string(),
                    ..Action::default()
                },
                Action {
                    date: "2024-06-14".to_string(),
                    description: "Do pass".to_string(),
                    classification: vec!["committee-passage".to_string()],
                    ..Action::default()
                },
            ],
            ..Bill::default()
        };
        classifier.report_all(&[enacted, busy])
    }

    #[test]
    fn slugs_are_filesystem_safe() {
        assert_eq!(note_slug("ocd-bill/1234-abcd"), "ocd-bill-1234-abcd");
        assert_eq!(note_slug("///"), "bill");
    }

    #[test]
    fn writes_bill_notes_and_indexes() {
        let dir = tempfile::tempdir().unwrap();
        build_notes(&reports(), dir.path(), datetime!(2024-06-15 12:00 UTC)).unwrap();

        let note = fs::read_to_string(dir.path().join("Bills/ocd-bill-enacted.md")).unwrap();
        assert!(note.contains("stage: Enacted"));
        assert!(note.contains("# AB 1: Clean Air"));
        assert!(note.contains("| Senate | yes | 2024-05-01 |"));

        let index = fs::read_to_string(dir.path().join("00_Index/MOC - Bills.md")).unwrap();
        assert!(index.contains(GENERATED_NOTICE));
        let enacted_at = index.find("AB 1").unwrap();
        let busy_at = index.find("SB 2").unwrap();
        assert!(enacted_at < busy_at);

        let trending = fs::read_to_string(dir.path().join("00_Index/MOC - Trending.md")).unwrap();
        assert!(trending.contains("[[Bills/ocd-bill-busy|SB 2]] (Velocity)"));
        assert!(!trending.contains("AB 1"));

        let momentum = fs::read_to_string(dir.path().join("00_Index/MOC - Momentum.md")).unwrap();
        assert!(momentum.contains("- Enacted (1)"));
        assert!(momentum.contains("- Medium (1)"));
    }

    #[test]
    fn frontmatter_values_are_quoted() {
        let bill = Bill {
            id: "ocd-bill/colon: case".to_string(),
            jurisdiction: Some(Jurisdiction {
                name: "Springfield: North".to_string(),
                ..Jurisdiction::default()
            }),
            ..Bill::default()
        };
        let report = Classifier::default().report(&bill);
        let dir = tempfile::tempdir().unwrap();
        build_notes(&[report], dir.path(), datetime!(2024-06-15 12:00 UTC)).unwrap();

        let path = dir.path().join(format!("Bills/{}.md", note_slug("ocd-bill/colon: case")));
        let note = fs::read_to_string(path).unwrap();
        assert!(note.contains("id: \"ocd-bill/colon: case\"\n"));
        assert!(note.contains("jurisdiction: \"Springfield: North\"\n"));
    }

    #[test]
    fn empty_input_still_writes_indexes() {
        let dir = tempfile::tempdir().unwrap();
        build_notes(&[], dir.path(), datetime!(2024-06-15 12:00 UTC)).unwrap();
        let trending = fs::read_to_string(dir.path().join("00_Index/MOC - Trending.md")).unwrap();
        assert!(trending.contains("_No trending bills._"));
    }
}

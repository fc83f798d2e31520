// kakushi/src/ui/summary.rs
//! Replacement summary table printed to stderr after a run.

use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};
use std::collections::BTreeMap;
use std::io::{self, Write};

use kakushi_core::PseudonymTable;

use crate::ui::output_format::paint;
use crate::ui::theme::{ThemeEntry, ThemeMap};

/// Builds the label / pseudonym / count table.
pub fn build_summary_table(counts: &BTreeMap<String, usize>, pseudonyms: &PseudonymTable) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .force_no_tty()
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Label", "Pseudonym", "Replacements"]);

    for (label, count) in counts {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(pseudonyms.describe(label)),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn print_summary<W: Write>(
    counts: &BTreeMap<String, usize>,
    pseudonyms: &PseudonymTable,
    writer: &mut W,
    theme: &ThemeMap,
    supports_color: bool,
) -> io::Result<()> {
    let total: usize = counts.values().sum();
    if total == 0 {
        return writeln!(
            writer,
            "{}",
            paint("No personal information found.", ThemeEntry::Info, theme, supports_color)
        );
    }
    writeln!(
        writer,
        "{}",
        paint("--- Replacement Summary ---", ThemeEntry::Header, theme, supports_color)
    )?;
    writeln!(writer, "{}", build_summary_table(counts, pseudonyms))?;
    writeln!(
        writer,
        "{}",
        paint(&format!("Total replacements: {}", total), ThemeEntry::SummaryCount, theme, supports_color)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;

    #[test]
    fn summary_lists_each_label_with_token() {
        let mut counts = BTreeMap::new();
        counts.insert("PHONE".to_string(), 2);
        counts.insert("EMAIL".to_string(), 1);
        let mut buf = Vec::new();
        print_summary(&counts, &PseudonymTable::default(), &mut buf, &ThemeStyle::default_theme_map(), false).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("PHONE"));
        assert!(out.contains("phonexxx"));
        assert!(out.contains("mailxxx"));
        assert!(out.contains("Total replacements: 3"));
    }

    #[test]
    fn hashed_summary_shows_token_format() {
        let pseudonyms = PseudonymTable::default()
            .with_style(kakushi_core::TokenStyle::Hashed {
                format: "{token}_{shorthash}".to_string(),
            })
            .unwrap();
        let mut counts = BTreeMap::new();
        counts.insert("PHONE".to_string(), 3);
        let rendered = build_summary_table(&counts, &pseudonyms).to_string();
        assert!(rendered.contains("phonexxx_{shorthash}"));
    }

    #[test]
    fn empty_summary_says_nothing_found() {
        let mut buf = Vec::new();
        print_summary(&BTreeMap::new(), &PseudonymTable::default(), &mut buf, &ThemeStyle::default_theme_map(), false).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("No personal information found."));
    }
}

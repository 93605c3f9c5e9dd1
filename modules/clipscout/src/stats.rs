/// Stats from a harvest run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub links_found: u32,
    pub videos_processed: u32,
    pub videos_skipped: u32,
    pub rows_appended: u32,
    pub duplicates_dropped: u32,
    pub analyzed_rows: u32,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Harvest Run Complete ===")?;
        writeln!(f, "Links found:        {}", self.links_found)?;
        writeln!(f, "Videos processed:   {}", self.videos_processed)?;
        writeln!(f, "Videos skipped:     {}", self.videos_skipped)?;
        writeln!(f, "Rows appended:      {}", self.rows_appended)?;
        writeln!(f, "Duplicates dropped: {}", self.duplicates_dropped)?;
        if self.analyzed_rows > 0 {
            writeln!(f, "Rows analyzed:      {}", self.analyzed_rows)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_omits_analysis_when_disabled() {
        let stats = RunStats {
            links_found: 5,
            videos_processed: 3,
            rows_appended: 3,
            ..Default::default()
        };
        let text = stats.to_string();
        assert!(text.contains("Links found:        5"));
        assert!(!text.contains("Rows analyzed"));
    }
}

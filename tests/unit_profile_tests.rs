//! # Profile Module Unit Tests / Profile 模块单元测试
//!
//! Tests for parsing Go coverage profiles and computing statement coverage.
//!
//! 测试 Go 覆盖率文件的解析以及语句覆盖率的计算。

use go_test_coverage::core::profile::{CoverMode, CoverageProfile, CoverageSummary};

#[cfg(test)]
mod parse_tests {
    use super::*;

    #[test]
    fn test_parse_single_package_profile() {
        let text = "mode: atomic\n\
                    example.com/app/main.go:10.13,12.2 1 5\n\
                    example.com/app/main.go:14.20,18.3 3 0\n";

        let profile = CoverageProfile::parse(text).unwrap();

        assert_eq!(profile.mode, CoverMode::Atomic);
        assert_eq!(profile.blocks.len(), 2);
        let first = &profile.blocks[0];
        assert_eq!(first.file, "example.com/app/main.go");
        assert_eq!((first.start_line, first.start_col), (10, 13));
        assert_eq!((first.end_line, first.end_col), (12, 2));
        assert_eq!(first.statements, 1);
        assert_eq!(first.count, 5);
    }

    #[test]
    fn test_parse_accepts_concatenated_profiles() {
        let text = "mode: atomic\n\
                    a/x.go:1.1,2.2 1 1\n\
                    mode: atomic\n\
                    b/y.go:1.1,2.2 2 0\n";

        let profile = CoverageProfile::parse(text).unwrap();

        assert_eq!(profile.blocks.len(), 2);
        assert_eq!(profile.blocks[1].file, "b/y.go");
    }

    #[test]
    fn test_parse_rejects_conflicting_modes() {
        let text = "mode: atomic\na/x.go:1.1,2.2 1 1\nmode: set\n";

        let err = CoverageProfile::parse(text).unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("line 3"), "{message}");
        assert!(message.contains("conflicts"), "{message}");
    }

    #[test]
    fn test_parse_requires_mode_header() {
        let err = CoverageProfile::parse("a/x.go:1.1,2.2 1 1\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 1"));

        let err = CoverageProfile::parse("").unwrap_err();
        assert!(err.to_string().contains("no 'mode:' header"));
    }

    #[test]
    fn test_parse_reports_malformed_record_line() {
        let text = "mode: count\na/x.go:1.1,2.2 1 1\na/x.go:oops 1 1\n";

        let err = CoverageProfile::parse(text).unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("line 3"), "{message}");
        assert!(message.contains("a/x.go:oops"), "{message}");
    }

    #[test]
    fn test_parse_rejects_unknown_mode_and_extra_fields() {
        assert!(CoverageProfile::parse("mode: sometimes\n").is_err());
        assert!(CoverageProfile::parse("mode: set\na.go:1.1,2.2 1 1 9\n").is_err());
        assert!(CoverageProfile::parse("mode: set\na.go:1.1,2.2 one 1\n").is_err());
    }

    #[test]
    fn test_parse_ignores_blank_lines_and_crlf() {
        let text = "mode: set\r\n\r\na.go:1.1,2.2 1 1\r\n";

        let profile = CoverageProfile::parse(text).unwrap();

        assert_eq!(profile.mode, CoverMode::Set);
        assert_eq!(profile.blocks.len(), 1);
    }
}

#[cfg(test)]
mod summary_tests {
    use super::*;

    #[test]
    fn test_summary_counts_covered_statements() {
        let text = "mode: atomic\n\
                    a/x.go:1.1,2.2 3 1\n\
                    a/x.go:3.1,4.2 1 0\n\
                    b/y.go:1.1,2.2 4 12\n";
        let profile = CoverageProfile::parse(text).unwrap();

        let summary = profile.summary();

        assert_eq!(summary, CoverageSummary { statements: 8, covered: 7 });
        assert!((summary.percent() - 87.5).abs() < f64::EPSILON);
        assert_eq!(summary.to_string(), "87.5% (7/8 statements)");
    }

    #[test]
    fn test_file_summaries_are_sorted_by_file() {
        let text = "mode: set\n\
                    z/last.go:1.1,2.2 2 0\n\
                    a/first.go:1.1,2.2 1 1\n\
                    z/last.go:3.1,4.2 2 1\n";
        let profile = CoverageProfile::parse(text).unwrap();

        let per_file: Vec<_> = profile.file_summaries().into_iter().collect();

        assert_eq!(per_file.len(), 2);
        assert_eq!(per_file[0].0, "a/first.go");
        assert_eq!(per_file[1].0, "z/last.go");
        assert_eq!(per_file[1].1, CoverageSummary { statements: 4, covered: 2 });
    }

    #[test]
    fn test_load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover_profile.out");
        std::fs::write(&path, "mode: count\npkg/a.go:1.1,1.20 1 2\n").unwrap();

        let profile = CoverageProfile::load(&path).unwrap();

        assert_eq!(profile.mode, CoverMode::Count);
        assert_eq!(profile.summary().covered, 1);
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = CoverageProfile::load(std::path::Path::new("/nonexistent/cover.out")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/cover.out"));
    }
}

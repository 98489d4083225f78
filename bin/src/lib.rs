pub mod cli;
pub mod commands;

#[cfg(test)]
mod tests {
    use birch::Workbench;

    #[test]
    fn workbench_starts_empty_and_clean() {
        let workbench = Workbench::new();
        assert!(workbench.text().is_empty());
        assert!(!workbench.is_dirty());
        assert!(workbench.outline().is_none());
    }

    #[test]
    fn validate_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xml");
        std::fs::write(&path, "<a><b></a>").unwrap();
        assert!(crate::commands::validate(&path).is_err());

        std::fs::write(&path, "<a><b/></a>").unwrap();
        assert!(crate::commands::validate(&path).is_ok());
    }

    #[test]
    fn format_rewrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.xml");
        std::fs::write(&path, "<a><b>1</b></a>").unwrap();
        crate::commands::format(&path, true).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<a>\n  <b>1</b>\n</a>\n"
        );
    }

    #[test]
    fn set_updates_one_element() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.xml");
        std::fs::write(&path, "<a><b>1</b></a>").unwrap();
        crate::commands::set(&path, "/0", "2").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<a>\n  <b>2</b>\n</a>\n"
        );
    }
}

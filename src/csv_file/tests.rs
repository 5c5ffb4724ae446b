mod csv_file_tests {
    use crate::csv_file::{CsvFileError, FileOptions, LazyCsvFile, LineCollection};
    use crate::error::LineError;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::NamedTempFile;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    const SAMPLE: &str = "identity/LineItemId,lineItem/UnblendedRate,lineItem/ResourceId\n\
                          a1,0.5,i-123\n\
                          a2,,\n\
                          a3,\"1,5\",i-456\n";

    fn plain_file(content: &str) -> std::io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    fn gzip_file(content: &str) -> std::io::Result<NamedTempFile> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(content.as_bytes())?;
        let bytes = encoder.finish()?;

        let mut file = NamedTempFile::new()?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(file)
    }

    fn read_texts(csv: &mut LazyCsvFile) -> Result<Vec<String>, CsvFileError> {
        let mut texts = Vec::new();
        while let Some(line) = csv.read_line()? {
            texts.push(line.to_string());
        }
        Ok(texts)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Headers & streaming
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_headers_from_first_line() -> TestResult {
        let tmp = plain_file(SAMPLE)?;
        let csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;

        let headers = csv.headers();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get("identity/LineItemId"), Some(0));
        assert_eq!(headers.get("lineItem/ResourceId"), Some(2));
        assert_eq!(csv.path(), tmp.path());
        Ok(())
    }

    #[test]
    fn test_read_line_streams_data_lines() -> TestResult {
        let tmp = plain_file(SAMPLE)?;
        let mut csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;

        assert!(!csv.is_at_end()?);
        {
            let line = csv.read_line()?.expect("first line");
            assert_eq!(line.get_by_name("identity/LineItemId")?, "a1");
            assert_eq!(line.get(1)?, "0.5");
        }
        {
            let line = csv.read_line()?.expect("second line");
            assert_eq!(line.get_by_name("lineItem/ResourceId")?, "");
        }
        {
            let line = csv.read_line()?.expect("third line");
            assert_eq!(line.get(1)?, "\"1,5\"");
            assert_eq!(line.get(2)?, "i-456");
        }
        assert!(csv.is_at_end()?);
        assert!(csv.read_line()?.is_none());
        Ok(())
    }

    #[test]
    fn test_transform_and_serialize() -> TestResult {
        let tmp = plain_file(SAMPLE)?;
        let mut csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;

        let mut out = Vec::new();
        while let Some(mut line) = csv.read_line()? {
            if line.get_by_name("lineItem/ResourceId")?.is_empty() {
                line.set_by_name("lineItem/ResourceId", "EMPTY")?;
            }
            out.push(line.to_string());
        }

        assert_eq!(out, ["a1,0.5,i-123", "a2,,EMPTY", "a3,\"1,5\",i-456"]);
        Ok(())
    }

    #[test]
    fn test_crlf_line_endings_are_stripped() -> TestResult {
        let tmp = plain_file("a,b\r\n1,2\r\n3,4")?;
        let mut csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;

        assert_eq!(csv.headers().get("b"), Some(1));
        assert_eq!(read_texts(&mut csv)?, ["1,2", "3,4"]);
        Ok(())
    }

    #[test]
    fn test_lone_carriage_return_ends_a_line() -> TestResult {
        let tmp = plain_file("a,b\r1,2\r3,4\r")?;
        let mut csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;

        assert_eq!(csv.headers().names().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(read_texts(&mut csv)?, ["1,2", "3,4"]);
        assert!(csv.is_at_end()?);
        Ok(())
    }

    #[test]
    fn test_mixed_line_endings() -> TestResult {
        let tmp = plain_file("a,b\n1,2\r\n3,4\r5,6\r\n7,8")?;
        let mut csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;

        assert_eq!(read_texts(&mut csv)?, ["1,2", "3,4", "5,6", "7,8"]);
        Ok(())
    }

    #[test]
    fn test_blank_line_is_malformed() -> TestResult {
        let tmp = plain_file("a,b\r1,2\r\r3,4\r")?;
        let csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;

        let results: Vec<_> = csv.cursor()?.collect();
        assert_eq!(results.len(), 3);
        assert!(matches!(
            &results[1],
            Err(CsvFileError::AtLine {
                line: 3,
                source: LineError::MalformedLine {
                    expected: 2,
                    found: 1
                }
            })
        ));
        assert_eq!(results[2].as_ref().map(|line| line.to_string()).ok(), Some("3,4".to_owned()));
        Ok(())
    }

    #[test]
    fn test_bom_is_stripped_from_header() -> TestResult {
        let tmp = plain_file("\u{feff}id,b\n1,2\n")?;
        let mut csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;

        assert_eq!(csv.headers().get("id"), Some(0));
        assert_eq!(csv.headers().names().collect::<Vec<_>>(), ["id", "b"]);
        {
            let line = csv.read_line()?.expect("line");
            assert_eq!(line.get_by_name("id")?, "1");
        }

        csv.reset_position()?;
        assert_eq!(read_texts(&mut csv)?, ["1,2"]);
        Ok(())
    }

    #[test]
    fn test_bom_is_stripped_from_gzip_header() -> TestResult {
        let tmp = gzip_file("\u{feff}id,b\n1,2\n")?;
        let csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;
        assert_eq!(csv.headers().get("id"), Some(0));
        Ok(())
    }

    #[test]
    fn test_reset_position_rewinds_to_first_data_line() -> TestResult {
        let tmp = plain_file(SAMPLE)?;
        let mut csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;

        let first = read_texts(&mut csv)?;
        assert!(csv.is_at_end()?);

        csv.reset_position()?;
        assert!(!csv.is_at_end()?);
        assert_eq!(read_texts(&mut csv)?, first);
        Ok(())
    }

    #[test]
    fn test_read_all_lines() -> TestResult {
        let tmp = plain_file(SAMPLE)?;
        let csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;

        let mut lines = csv.read_all_lines()?;
        assert_eq!(lines.len(), 3);

        lines[0].set(1, "1.0")?;
        assert_eq!(lines[0].to_string(), "a1,1.0,i-123");
        assert_eq!(lines[2].get(0)?, "a3");
        Ok(())
    }

    #[test]
    fn test_cursors_are_independent() -> TestResult {
        let tmp = plain_file(SAMPLE)?;
        let csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;

        let mut first = csv.cursor()?;
        let mut second = csv.cursor()?;

        let a = first.read_line()?.expect("line");
        let b = first.read_line()?.expect("line");
        let c = second.read_line()?.expect("line");

        assert_eq!(a.get(0)?, "a1");
        assert_eq!(b.get(0)?, "a2");
        assert_eq!(c.get(0)?, "a1");
        assert_eq!(second.count(), 2);
        Ok(())
    }

    #[test]
    fn test_empty_file_has_no_header() -> TestResult {
        let tmp = plain_file("")?;
        let err = LazyCsvFile::open(tmp.path(), FileOptions::default())
            .err()
            .expect("open should fail");
        assert!(matches!(err, CsvFileError::MissingHeader(_)));
        Ok(())
    }

    #[test]
    fn test_header_only_file_is_at_end() -> TestResult {
        let tmp = plain_file("a,b,c\n")?;
        let mut csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;
        assert!(csv.is_at_end()?);
        assert!(csv.read_line()?.is_none());
        Ok(())
    }

    #[test]
    fn test_malformed_line_reports_line_number() -> TestResult {
        let tmp = plain_file("a,b,c\n1,2,3\n4,5\n")?;
        let csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;

        let err = csv.read_all_lines().err().expect("second data line is short");
        match err {
            CsvFileError::AtLine { line, source } => {
                assert_eq!(line, 3);
                assert_eq!(
                    source,
                    LineError::MalformedLine {
                        expected: 3,
                        found: 2
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Compression
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_gzip_detected_by_magic_bytes() -> TestResult {
        let tmp = gzip_file(SAMPLE)?;
        let mut csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;

        assert_eq!(csv.headers().len(), 3);
        assert_eq!(read_texts(&mut csv)?, ["a1,0.5,i-123", "a2,,", "a3,\"1,5\",i-456"]);
        Ok(())
    }

    #[test]
    fn test_forced_decompression_of_gzip() -> TestResult {
        let tmp = gzip_file(SAMPLE)?;
        let options = FileOptions::default().with_force_decompression(true);
        let mut csv = LazyCsvFile::open(tmp.path(), options)?;

        assert_eq!(read_texts(&mut csv)?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_forced_decompression_of_plain_text_fails() -> TestResult {
        let tmp = plain_file(SAMPLE)?;
        let options = FileOptions::default().with_force_decompression(true);

        let err = LazyCsvFile::open(tmp.path(), options)
            .err()
            .expect("plain text is not gzip");
        assert!(matches!(err, CsvFileError::Io(_)));
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Options
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_options_propagate_to_lines() -> TestResult {
        let tmp = plain_file(SAMPLE)?;
        let options = FileOptions::default()
            .with_line_slack(0)
            .with_prevent_reallocation(true);
        let mut csv = LazyCsvFile::open(tmp.path(), options)?;

        let mut line = csv.read_line()?.expect("line");
        assert_eq!(line.slack(), 0);
        assert!(line.prevent_reallocation());
        assert_eq!(
            line.set(0, "longer"),
            Err(LineError::CapacityExceeded {
                required: 4,
                available: 0
            })
        );
        assert_eq!(line.to_string(), "a1,0.5,i-123");
        Ok(())
    }

    #[test]
    fn test_default_slack_per_line() -> TestResult {
        let tmp = plain_file(SAMPLE)?;
        let mut csv = LazyCsvFile::open(tmp.path(), FileOptions::default())?;

        // "a1,0.5,i-123" is 12 bytes long.
        let line = csv.read_line()?.expect("line");
        assert_eq!(line.slack(), 2);
        assert!(!line.prevent_reallocation());
        Ok(())
    }

    #[test]
    fn test_options_from_json() -> TestResult {
        let options = FileOptions::from_json_str(r#"{ "line_slack": 16, "prevent_reallocation": true }"#)?;
        assert_eq!(
            options,
            FileOptions {
                force_decompression: false,
                line_slack: Some(16),
                prevent_reallocation: true,
            }
        );

        let tmp = plain_file(r#"{ "force_decompression": true }"#)?;
        let options = FileOptions::from_json_file(tmp.path())?;
        assert!(options.force_decompression);
        assert_eq!(options.line_slack, None);

        assert!(matches!(
            FileOptions::from_json_str("{ \"line_slack\": -1 }"),
            Err(CsvFileError::Options(_))
        ));
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // LineCollection
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_line_collection_loads_everything() -> TestResult {
        let tmp = plain_file(SAMPLE)?;
        let collection = LineCollection::load_from(tmp.path())?;

        assert_eq!(
            collection.headers,
            ["identity/LineItemId", "lineItem/UnblendedRate", "lineItem/ResourceId"]
        );
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.lines[1], "a2,,");
        Ok(())
    }

    #[test]
    fn test_line_collection_strips_bom() -> TestResult {
        let tmp = plain_file("\u{feff}id,b\r\n1,2\r\n")?;
        let collection = LineCollection::load_from(tmp.path())?;

        assert_eq!(collection.headers, ["id", "b"]);
        assert_eq!(collection.lines, ["1,2"]);
        Ok(())
    }

    #[test]
    fn test_line_collection_of_empty_file() -> TestResult {
        let tmp = plain_file("")?;
        let collection = LineCollection::load_from(tmp.path())?;
        assert!(collection.headers.is_empty());
        assert!(collection.is_empty());
        Ok(())
    }
}

//! Row-wise flattening for tabular sources.

/// Turns CSV data into one text line per record, labelling fields with
/// their column headers so each row stays a self-contained unit of text.
pub fn csv_to_lines(data: &str) -> Result<String, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());
    let headers = reader.headers()?.clone();

    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut fields = Vec::with_capacity(record.len());
        for (idx, value) in record.iter().enumerate() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match headers.get(idx).map(str::trim).filter(|h| !h.is_empty()) {
                Some(header) => fields.push(format!("{header}: {value}")),
                None => fields.push(value.to_string()),
            }
        }
        if !fields.is_empty() {
            lines.push(fields.join("; "));
        }
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::csv_to_lines;

    #[test]
    fn rows_become_labelled_lines() {
        let data = "name,role\nAda,engineer\nGrace,admiral\n";
        assert_eq!(
            csv_to_lines(data).unwrap(),
            "name: Ada; role: engineer\nname: Grace; role: admiral"
        );
    }

    #[test]
    fn empty_fields_and_rows_are_dropped() {
        let data = "a,b\n1,\n,\n";
        assert_eq!(csv_to_lines(data).unwrap(), "a: 1");
    }

    #[test]
    fn ragged_rows_are_tolerated() {
        let data = "a,b\n1,2,3\n";
        assert_eq!(csv_to_lines(data).unwrap(), "a: 1; b: 2; 3");
    }
}

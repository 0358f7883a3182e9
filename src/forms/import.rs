use std::io::Read;

use crate::forms::FormError;
use crate::forms::record::RecordForm;

/// Parses a CSV document with a header row into record forms.
///
/// Recognised columns are `name`, `address`, `email` and `telephone`
/// (`phone` is accepted as an alias). Unknown columns are ignored. Rows are
/// not validated here; the controller validates each record before saving.
pub fn parse_records_csv<R: Read>(reader: R) -> Result<Vec<RecordForm>, FormError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |wanted: &[&str]| {
        headers
            .iter()
            .position(|h| wanted.iter().any(|w| h.eq_ignore_ascii_case(w)))
    };

    let name = column(&["name"]).ok_or(FormError::MissingColumn("name"))?;
    let email = column(&["email"]).ok_or(FormError::MissingColumn("email"))?;
    let address = column(&["address"]);
    let telephone = column(&["telephone", "phone"]);

    let mut forms = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let field = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or_default();
        forms.push(RecordForm::new(
            None,
            field(Some(name)),
            field(address),
            field(Some(email)),
            field(telephone),
        ));
    }

    Ok(forms)
}

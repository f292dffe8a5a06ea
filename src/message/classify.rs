use super::MessageKind;

/// Classifies the report/locator field of a received message.
///
/// Total: every field maps to exactly one kind, falling through to
/// [`MessageKind::Report`].
pub fn classify(field: &str) -> MessageKind {
    let field = field.trim();
    if is_grid_locator(field) {
        MessageKind::Grid
    } else if field == "73" {
        MessageKind::Final
    } else if field == "RR73" || field == "RRR" {
        MessageKind::RogerReport
    } else if field.starts_with('R') {
        MessageKind::AckReport
    } else {
        MessageKind::Report
    }
}

/// True for a Maidenhead square (`FN31`) or subsquare (`FN31pr`).
///
/// `RR73` has the shape of a square in the Arctic and is excluded.
pub fn is_grid_locator(field: &str) -> bool {
    let b = field.as_bytes();
    if b.len() != 4 && b.len() != 6 {
        return false;
    }
    if field.eq_ignore_ascii_case("RR73") {
        return false;
    }

    let field_letter = |c: u8| matches!(c.to_ascii_uppercase(), b'A'..=b'R');
    let sub_letter = |c: u8| matches!(c.to_ascii_uppercase(), b'A'..=b'X');

    let square = field_letter(b[0])
        && field_letter(b[1])
        && b[2].is_ascii_digit()
        && b[3].is_ascii_digit();

    square && (b.len() == 4 || (sub_letter(b[4]) && sub_letter(b[5])))
}

//! Validation helpers for DTOs.

use validator::ValidationError;

const PLAYER_ID_MAX_LEN: usize = 128;
const PROMOTION_PIECES: [&str; 4] = ["q", "r", "b", "n"];

/// Validates an algebraic square name such as `e4`.
///
/// # Examples
///
/// ```ignore
/// validate_square("e4") // Ok
/// validate_square("E4") // Ok, files are case-insensitive
/// validate_square("i9") // Err
/// ```
pub fn validate_square(square: &str) -> Result<(), ValidationError> {
    let bytes = square.as_bytes();
    let valid = bytes.len() == 2
        && matches!(bytes[0].to_ascii_lowercase(), b'a'..=b'h')
        && matches!(bytes[1], b'1'..=b'8');

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("square_format");
        err.message = Some(format!("`{square}` is not a square between a1 and h8").into());
        Err(err)
    }
}

/// Validates a promotion piece letter (`q`, `r`, `b` or `n`, any case).
pub fn validate_promotion(piece: &str) -> Result<(), ValidationError> {
    if PROMOTION_PIECES.contains(&piece.to_ascii_lowercase().as_str()) {
        return Ok(());
    }
    let mut err = ValidationError::new("promotion_piece");
    err.message = Some(format!("`{piece}` is not one of q, r, b, n").into());
    Err(err)
}

/// Validates an opaque client identifier.
///
/// Identifiers are generated by the browser (usually a UUID) and only need to be
/// short and free of characters that would need escaping in storage filters.
pub fn validate_player_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > PLAYER_ID_MAX_LEN {
        let mut err = ValidationError::new("player_id_length");
        err.message = Some(
            format!(
                "Player ID must be between 1 and {PLAYER_ID_MAX_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("player_id_format");
        err.message =
            Some("Player ID must contain only ASCII letters, digits, `-` or `_`".into());
        return Err(err);
    }

    Ok(())
}

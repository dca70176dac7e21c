//! Byte-level text encoding of manifest files.
//!
//! Files are written in the encoding their declaration names. On load the
//! encoding comes from a byte-order mark, then the declaration, then
//! defaults to UTF-8.

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};

use super::error::ManifestError;

/// Encode `text` as `label`.
///
/// Characters the target encoding cannot represent are written as numeric
/// character references, which XML readers resolve back to the original
/// character. UTF-16 output starts with a byte-order mark.
pub(crate) fn encode(text: &str, label: &str) -> Result<Vec<u8>, ManifestError> {
  let encoding = Encoding::for_label(label.trim().as_bytes())
    .ok_or_else(|| ManifestError::UnsupportedEncoding(label.to_string()))?;

  if encoding == UTF_16LE || encoding == UTF_16BE {
    let units = "\u{feff}".encode_utf16().chain(text.encode_utf16());
    return Ok(if encoding == UTF_16LE {
      units.flat_map(u16::to_le_bytes).collect()
    } else {
      units.flat_map(u16::to_be_bytes).collect()
    });
  }
  // Only the `replacement` pseudo-encoding has no encoder of its own
  if encoding.output_encoding() != encoding {
    return Err(ManifestError::UnsupportedEncoding(label.to_string()));
  }

  let (bytes, _, _) = encoding.encode(text);
  Ok(bytes.into_owned())
}

/// Decode file bytes to text.
///
/// On failure the error names the encoding the bytes were not valid in.
pub(crate) fn decode(bytes: &[u8]) -> Result<String, &'static Encoding> {
  let encoding = match Encoding::for_bom(bytes) {
    Some((encoding, _)) => encoding,
    None => declared_encoding(bytes).unwrap_or(UTF_8),
  };
  let (text, used, had_errors) = encoding.decode(bytes);
  if had_errors {
    return Err(used);
  }
  Ok(text.into_owned())
}

/// The `encoding` named by a leading `<?xml ...?>` declaration.
///
/// Only ASCII-compatible encodings are honored here, since a declaration
/// readable as ASCII rules out the others.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
  let head = bytes.strip_prefix(b"<?xml")?;
  let end = head.windows(2).position(|pair| pair == b"?>")?;
  let declaration = std::str::from_utf8(&head[..end]).ok()?;

  let (_, rest) = declaration.split_once("encoding")?;
  let rest = rest.trim_start().strip_prefix('=')?.trim_start();
  let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
  let label = rest[1..].split(quote).next()?;

  Encoding::for_label(label.as_bytes()).filter(|encoding| encoding.is_ascii_compatible())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn latin1_is_one_byte_per_character() {
    let bytes = encode("Café", "ISO-8859-1").unwrap();
    assert_eq!(bytes, b"Caf\xe9");
  }

  #[test]
  fn unmappable_characters_become_references() {
    let bytes = encode("\u{3042}", "ISO-8859-1").unwrap();
    assert_eq!(bytes, b"&#12354;");
  }

  #[test]
  fn utf16_output_has_bom() {
    assert_eq!(encode("A", "UTF-16LE").unwrap(), vec![0xff, 0xfe, b'A', 0]);
    assert_eq!(encode("A", "UTF-16BE").unwrap(), vec![0xfe, 0xff, 0, b'A']);
  }

  #[test]
  fn unknown_label_is_rejected() {
    let err = encode("x", "EBCDIC-42").unwrap_err();
    assert!(matches!(err, ManifestError::UnsupportedEncoding(ref label) if label == "EBCDIC-42"));
    assert!(encode("x", "replacement").is_err());
  }

  #[test]
  fn declaration_selects_decoder() {
    let bytes = b"<?xml version=\"1.0\" encoding='ISO-8859-1'?><a b=\"Caf\xe9\"/>";
    assert_eq!(
      decode(bytes).unwrap(),
      "<?xml version=\"1.0\" encoding='ISO-8859-1'?><a b=\"Café\"/>"
    );
  }

  #[test]
  fn bom_wins_over_declaration() {
    let text = "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a/>";
    let bytes = encode(text, "UTF-16LE").unwrap();
    assert_eq!(decode(&bytes).unwrap(), text);
  }

  #[test]
  fn undeclared_text_is_utf8() {
    assert_eq!(decode("<a b=\"é\"/>".as_bytes()).unwrap(), "<a b=\"é\"/>");
    assert_eq!(decode(b"<a b=\"\xe9\"/>").unwrap_err(), UTF_8);
  }
}

//! RFC 4514 serialization of distinguished names.

use x509_parser::asn1_rs::{Any, Class};
use x509_parser::x509::{AttributeTypeAndValue, X509Name};

/// ASN.1 universal tag numbers this module cares about
const TAG_UNIVERSAL_STRING: u32 = 28;
const TAG_BMP_STRING: u32 = 30;

/// Short names RFC 4514 section 3 defines; everything else is written as a dotted OID.
fn attribute_short_name(oid: &str) -> Option<&'static str> {
    match oid {
        "2.5.4.3" => Some("CN"),
        "2.5.4.7" => Some("L"),
        "2.5.4.8" => Some("ST"),
        "2.5.4.10" => Some("O"),
        "2.5.4.11" => Some("OU"),
        "2.5.4.6" => Some("C"),
        "2.5.4.9" => Some("STREET"),
        "0.9.2342.19200300.100.1.25" => Some("DC"),
        "0.9.2342.19200300.100.1.1" => Some("UID"),
        _ => None,
    }
}

/// Serializes a DN the way RFC 4514 prescribes: RDNs in reverse encoding
/// order joined by `,`, multi-valued RDNs joined by `+`.
///
/// An empty DN serializes to an empty string.
pub fn format_rfc4514(name: &X509Name<'_>) -> String {
    let rdns: Vec<String> = name
        .iter()
        .map(|rdn| {
            rdn.iter()
                .map(format_attribute)
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect();

    rdns.into_iter().rev().collect::<Vec<_>>().join(",")
}

fn format_attribute(attr: &AttributeTypeAndValue<'_>) -> String {
    let oid = attr.attr_type().to_id_string();
    let key = attribute_short_name(&oid)
        .map(str::to_string)
        .unwrap_or(oid);

    let value = attr.attr_value();
    let rendered = match (value.header.class(), value.tag().0) {
        (Class::Universal, TAG_BMP_STRING) => decode_bmp(value.data).map(|s| escape_value(&s)),
        (Class::Universal, TAG_UNIVERSAL_STRING) => {
            decode_universal(value.data).map(|s| escape_value(&s))
        }
        (Class::Universal, _) => attr.as_str().ok().map(escape_value),
        _ => None,
    };

    let rendered = rendered.unwrap_or_else(|| hex_encoding(value));
    format!("{key}={rendered}")
}

/// UCS-2 / UTF-16 big-endian
fn decode_bmp(data: &[u8]) -> Option<String> {
    if data.len() % 2 != 0 {
        return None;
    }
    let units = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

/// UCS-4 big-endian
fn decode_universal(data: &[u8]) -> Option<String> {
    if data.len() % 4 != 0 {
        return None;
    }
    data.chunks_exact(4)
        .map(|quad| char::from_u32(u32::from_be_bytes([quad[0], quad[1], quad[2], quad[3]])))
        .collect()
}

/// Escapes an attribute value per RFC 4514 section 2.4.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);

    for (i, c) in value.chars().enumerate() {
        match c {
            '"' | '+' | ',' | ';' | '<' | '>' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '#' if i == 0 => out.push_str("\\#"),
            ' ' if i == 0 || i == last => out.push_str("\\ "),
            '\0' => out.push_str("\\00"),
            _ => out.push(c),
        }
    }
    out
}

/// `#` followed by the hex DER of the whole value (RFC 4514 section 2.4).
fn hex_encoding(value: &Any<'_>) -> String {
    let header = &value.header;
    let mut der = match header.raw_tag() {
        Some(raw) => raw.to_vec(),
        None => identifier_octets(header.class(), header.is_constructed(), header.tag().0),
    };
    let len = value.data.len();
    if len < 0x80 {
        der.push(len as u8);
    } else {
        let bytes: Vec<u8> = len
            .to_be_bytes()
            .into_iter()
            .skip_while(|b| *b == 0)
            .collect();
        der.push(0x80 | bytes.len() as u8);
        der.extend(bytes);
    }
    der.extend_from_slice(value.data);

    let hex: String = der.iter().map(|b| format!("{b:02x}")).collect();
    format!("#{hex}")
}

/// X.690 identifier octets, high-tag-number form above 30.
fn identifier_octets(class: Class, constructed: bool, tag: u32) -> Vec<u8> {
    let mut first = (class as u8) << 6;
    if constructed {
        first |= 0x20;
    }
    if tag < 0x1f {
        return vec![first | tag as u8];
    }

    let mut groups = Vec::new();
    let mut rest = tag;
    loop {
        groups.push((rest & 0x7f) as u8);
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    let mut octets = vec![first | 0x1f];
    let last = groups.len() - 1;
    for (i, group) in groups.into_iter().rev().enumerate() {
        octets.push(if i < last { group | 0x80 } else { group });
    }
    octets
}

#[cfg(test)]
mod tests {
    use super::*;
    use x509_parser::asn1_rs::{Header, Length, Tag};

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape_value("Example, Inc."), "Example\\, Inc.");
        assert_eq!(escape_value("a+b"), "a\\+b");
        assert_eq!(escape_value("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_value("back\\slash"), "back\\\\slash");
        assert_eq!(escape_value("<tag>;"), "\\<tag\\>\\;");
    }

    #[test]
    fn test_escape_leading_and_trailing() {
        assert_eq!(escape_value("#1"), "\\#1");
        assert_eq!(escape_value("a#1"), "a#1");
        assert_eq!(escape_value(" padded "), "\\ padded\\ ");
        assert_eq!(escape_value("in between"), "in between");
    }

    #[test]
    fn test_escape_plain_value_untouched() {
        assert_eq!(escape_value("example.com"), "example.com");
        assert_eq!(escape_value(""), "");
    }

    #[test]
    fn test_short_names() {
        assert_eq!(attribute_short_name("2.5.4.3"), Some("CN"));
        assert_eq!(attribute_short_name("2.5.4.6"), Some("C"));
        assert_eq!(attribute_short_name("1.2.840.113549.1.9.1"), None);
    }

    #[test]
    fn test_decode_bmp() {
        let data = [0x00, 0x41, 0x00, 0xe9];
        assert_eq!(decode_bmp(&data).as_deref(), Some("Aé"));
        assert_eq!(decode_bmp(&[0x00]), None);
    }

    fn any(class: Class, constructed: bool, tag: u32, data: &[u8]) -> Any<'_> {
        let header = Header::new(class, constructed, Tag(tag), Length::Definite(data.len()));
        Any::new(header, data)
    }

    #[test]
    fn test_hex_encoding_includes_tag_and_length() {
        // OCTET STRING 0x01 0x02
        let value = any(Class::Universal, false, 4, &[0x01, 0x02]);
        assert_eq!(hex_encoding(&value), "#04020102");
    }

    #[test]
    fn test_hex_encoding_keeps_tag_class() {
        let value = any(Class::ContextSpecific, false, 0, &[0x01, 0x02]);
        assert_eq!(hex_encoding(&value), "#80020102");
        let value = any(Class::Application, true, 3, &[]);
        assert_eq!(hex_encoding(&value), "#6300");
    }

    #[test]
    fn test_hex_encoding_high_tag_number() {
        assert_eq!(identifier_octets(Class::ContextSpecific, false, 31), vec![0x9f, 0x1f]);
        assert_eq!(identifier_octets(Class::Universal, false, 201), vec![0x1f, 0x81, 0x49]);
    }

    #[test]
    fn test_hex_encoding_uses_parsed_identifier() {
        use x509_parser::asn1_rs::FromDer;

        // [APPLICATION 5] PrintableString-like payload "ab"
        let der = [0x45, 0x02, 0x61, 0x62];
        let (_, value) = Any::from_der(&der).expect("parses");
        assert_eq!(hex_encoding(&value), "#45026162");
    }
}

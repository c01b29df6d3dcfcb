//! IFC GlobalId <-> UUID conversion.
//!
//! An IFC GlobalId is a 128-bit UUID written as 22 characters of a
//! base-64 alphabet: the first character carries the top 2 bits, each
//! following one 6 bits.

use crate::error::GuidError;
use uuid::Uuid;

const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_$";

pub const IFC_GUID_LEN: usize = 22;
const UUID_LEN: usize = 36;

/// Encodes a UUID as a 22-character IFC GlobalId.
#[must_use]
pub fn compress(uuid: Uuid) -> String {
    let value = uuid.as_u128();
    (0..IFC_GUID_LEN)
        .map(|i| {
            let shift = 6 * (IFC_GUID_LEN - 1 - i);
            let digit = (value >> shift) & 0x3f;
            char::from(ALPHABET[digit as usize])
        })
        .collect()
}

fn digit(guid: &str, ch: char) -> Result<u128, GuidError> {
    ALPHABET
        .iter()
        .position(|&c| char::from(c) == ch)
        .map(|i| i as u128)
        .ok_or_else(|| GuidError::InvalidChar {
            guid: guid.to_string(),
            ch,
        })
}

/// Decodes a 22-character IFC GlobalId into a UUID.
pub fn expand(guid: &str) -> Result<Uuid, GuidError> {
    if guid.chars().count() != IFC_GUID_LEN {
        return Err(GuidError::UnknownFormat(guid.to_string()));
    }

    let mut value: u128 = 0;
    for (i, ch) in guid.chars().enumerate() {
        let d = digit(guid, ch)?;
        // Only 2 bits remain for the leading character
        if i == 0 && d > 3 {
            return Err(GuidError::InvalidChar {
                guid: guid.to_string(),
                ch,
            });
        }
        value = (value << 6) | d;
    }
    Ok(Uuid::from_u128(value))
}

/// Normalises a component id for a BCF viewpoint.
///
/// IFC GlobalIds pass through after validation, hyphenated UUIDs are
/// compressed, anything else is rejected.
pub fn to_ifc_guid(guid: &str) -> Result<String, GuidError> {
    match guid.len() {
        IFC_GUID_LEN => expand(guid).map(|_| guid.to_string()),
        UUID_LEN => Uuid::parse_str(guid)
            .map(compress)
            .map_err(|source| GuidError::Uuid {
                guid: guid.to_string(),
                source,
            }),
        _ => Err(GuidError::UnknownFormat(guid.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // Reference pair produced by IfcOpenShell's ifcopenshell.guid.compress
    const UUID: &str = "23ab5e6a-c8d0-4ac7-a3f0-9c01e1e1b2f2";
    const IFC: &str = "0ZgrvgoD1AnwFmd07XuRBo";

    #[test]
    fn compresses_uuid() {
        let uuid = Uuid::parse_str(UUID).unwrap();
        assert_eq!(compress(uuid), IFC);
    }

    #[test]
    fn expands_global_id() {
        assert_eq!(expand(IFC).unwrap().to_string(), UUID);
    }

    #[test]
    fn random_uuids_survive_a_round_trip() {
        for _ in 0..16 {
            let uuid = Uuid::new_v4();
            assert_eq!(expand(&compress(uuid)).unwrap(), uuid);
        }
    }

    #[test]
    fn to_ifc_guid_accepts_both_forms() {
        assert_eq!(to_ifc_guid(IFC).unwrap(), IFC);
        assert_eq!(to_ifc_guid(UUID).unwrap(), IFC);
    }

    #[test]
    fn to_ifc_guid_rejects_other_lengths() {
        assert!(matches!(
            to_ifc_guid("not-a-guid"),
            Err(GuidError::UnknownFormat(_))
        ));
    }

    #[test]
    fn leading_character_is_limited_to_two_bits() {
        let result = expand("4ZgrvgoD1AnwFmd07XuRBo");
        assert!(matches!(result, Err(GuidError::InvalidChar { ch: '4', .. })));
    }
}

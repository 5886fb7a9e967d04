//! Key Serializer
//!
//! `serde::Serializer` producing [`KeyPart`]s directly, so that no argument
//! information is lost on the way to a cache key: float bits survive
//! (including NaN and infinities), and `None` stays distinct from unit.

use serde::ser::{self, Serialize};
use thiserror::Error;

use crate::memo::KeyPart;

/// Why an argument could not be turned into a key part.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct KeyError(String);

impl ser::Error for KeyError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        KeyError(msg.to_string())
    }
}

type KeyResult = std::result::Result<KeyPart, KeyError>;

/// Serializes any value into its key part.
pub(crate) fn to_key_part<T>(value: &T) -> KeyResult
where
    T: Serialize + ?Sized,
{
    value.serialize(KeySerializer)
}

/// `-0.0` folds into `0.0` and every NaN into one canonical NaN; all other
/// bit patterns are kept.
fn float_part(v: f64) -> KeyPart {
    let canonical = if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    };
    KeyPart::Float(canonical.to_bits())
}

fn map_part(mut pairs: Vec<(KeyPart, KeyPart)>) -> KeyPart {
    pairs.sort();
    KeyPart::Map(pairs)
}

fn tagged(variant: &'static str, part: KeyPart) -> KeyPart {
    KeyPart::Map(vec![(KeyPart::Str(variant.to_string()), part)])
}

struct KeySerializer;

impl ser::Serializer for KeySerializer {
    type Ok = KeyPart;
    type Error = KeyError;

    type SerializeSeq = SeqParts;
    type SerializeTuple = SeqParts;
    type SerializeTupleStruct = SeqParts;
    type SerializeTupleVariant = SeqParts;
    type SerializeMap = MapParts;
    type SerializeStruct = MapParts;
    type SerializeStructVariant = MapParts;

    fn serialize_bool(self, v: bool) -> KeyResult {
        Ok(KeyPart::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> KeyResult {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> KeyResult {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> KeyResult {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> KeyResult {
        Ok(KeyPart::Int(v))
    }

    fn serialize_i128(self, v: i128) -> KeyResult {
        if let Ok(small) = i64::try_from(v) {
            return Ok(KeyPart::Int(small));
        }
        u64::try_from(v)
            .map(KeyPart::UInt)
            .map_err(|_| KeyError(format!("integer {} is out of range", v)))
    }

    fn serialize_u8(self, v: u8) -> KeyResult {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> KeyResult {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> KeyResult {
        self.serialize_u64(u64::from(v))
    }

    // Same key for the same number regardless of integer type
    fn serialize_u64(self, v: u64) -> KeyResult {
        Ok(match i64::try_from(v) {
            Ok(small) => KeyPart::Int(small),
            Err(_) => KeyPart::UInt(v),
        })
    }

    fn serialize_u128(self, v: u128) -> KeyResult {
        u64::try_from(v)
            .map_err(|_| KeyError(format!("integer {} is out of range", v)))
            .and_then(|v| self.serialize_u64(v))
    }

    fn serialize_f32(self, v: f32) -> KeyResult {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> KeyResult {
        Ok(float_part(v))
    }

    fn serialize_char(self, v: char) -> KeyResult {
        Ok(KeyPart::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> KeyResult {
        Ok(KeyPart::Str(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> KeyResult {
        Ok(KeyPart::Seq(
            v.iter().map(|b| KeyPart::Int(i64::from(*b))).collect(),
        ))
    }

    fn serialize_none(self) -> KeyResult {
        Ok(KeyPart::None)
    }

    fn serialize_some<T>(self, value: &T) -> KeyResult
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> KeyResult {
        Ok(KeyPart::Unit)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> KeyResult {
        Ok(KeyPart::Unit)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> KeyResult {
        Ok(KeyPart::Str(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> KeyResult
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> KeyResult
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, to_key_part(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqParts, KeyError> {
        Ok(SeqParts::new(None, len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqParts, KeyError> {
        Ok(SeqParts::new(None, len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqParts, KeyError> {
        Ok(SeqParts::new(None, len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqParts, KeyError> {
        Ok(SeqParts::new(Some(variant), len))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapParts, KeyError> {
        Ok(MapParts::new(None, len.unwrap_or(0)))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapParts, KeyError> {
        Ok(MapParts::new(None, len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<MapParts, KeyError> {
        Ok(MapParts::new(Some(variant), len))
    }
}

// == Compound Builders ==
/// Elements of a sequence, tuple or tuple variant.
struct SeqParts {
    variant: Option<&'static str>,
    items: Vec<KeyPart>,
}

impl SeqParts {
    fn new(variant: Option<&'static str>, len: usize) -> Self {
        Self {
            variant,
            items: Vec::with_capacity(len),
        }
    }

    fn push<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(to_key_part(value)?);
        Ok(())
    }

    fn finish(self) -> KeyResult {
        let part = KeyPart::Seq(self.items);
        Ok(match self.variant {
            Some(variant) => tagged(variant, part),
            None => part,
        })
    }
}

impl ser::SerializeSeq for SeqParts {
    type Ok = KeyPart;
    type Error = KeyError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> KeyResult {
        self.finish()
    }
}

impl ser::SerializeTuple for SeqParts {
    type Ok = KeyPart;
    type Error = KeyError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> KeyResult {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for SeqParts {
    type Ok = KeyPart;
    type Error = KeyError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> KeyResult {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for SeqParts {
    type Ok = KeyPart;
    type Error = KeyError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> KeyResult {
        self.finish()
    }
}

/// Entries of a map, struct or struct variant.
struct MapParts {
    variant: Option<&'static str>,
    pairs: Vec<(KeyPart, KeyPart)>,
    pending_key: Option<KeyPart>,
}

impl MapParts {
    fn new(variant: Option<&'static str>, len: usize) -> Self {
        Self {
            variant,
            pairs: Vec::with_capacity(len),
            pending_key: None,
        }
    }

    fn field<T>(&mut self, name: &'static str, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.pairs
            .push((KeyPart::Str(name.to_string()), to_key_part(value)?));
        Ok(())
    }

    fn finish(self) -> KeyResult {
        let part = map_part(self.pairs);
        Ok(match self.variant {
            Some(variant) => tagged(variant, part),
            None => part,
        })
    }
}

impl ser::SerializeMap for MapParts {
    type Ok = KeyPart;
    type Error = KeyError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.pending_key = Some(to_key_part(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| KeyError("map value without a key".to_string()))?;
        self.pairs.push((key, to_key_part(value)?));
        Ok(())
    }

    fn end(self) -> KeyResult {
        self.finish()
    }
}

impl ser::SerializeStruct for MapParts {
    type Ok = KeyPart;
    type Error = KeyError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> KeyResult {
        self.finish()
    }
}

impl ser::SerializeStructVariant for MapParts {
    type Ok = KeyPart;
    type Error = KeyError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), KeyError>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> KeyResult {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Query {
        path: String,
        limit: Option<u32>,
    }

    #[derive(Serialize)]
    enum Shape {
        Circle(f64),
        Rect { w: u32, h: u32 },
        Empty,
    }

    #[test]
    fn test_floats_keep_their_bits() {
        let parts: Vec<KeyPart> = [1.5, f64::INFINITY, f64::NEG_INFINITY, f64::NAN]
            .iter()
            .map(|v| to_key_part(v).unwrap())
            .collect();

        for (i, a) in parts.iter().enumerate() {
            for b in &parts[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(to_key_part(&-f64::NAN).unwrap(), to_key_part(&f64::NAN).unwrap());
        assert_eq!(to_key_part(&-0.0f64).unwrap(), to_key_part(&0.0f64).unwrap());
    }

    #[test]
    fn test_none_unit_and_nan_are_distinct() {
        let none = to_key_part(&Option::<u8>::None).unwrap();
        let unit = to_key_part(&()).unwrap();
        let nan = to_key_part(&f64::NAN).unwrap();

        assert_eq!(none, KeyPart::None);
        assert_eq!(unit, KeyPart::Unit);
        assert_ne!(nan, none);
        assert_ne!(nan, unit);
    }

    #[test]
    fn test_integer_width_does_not_matter() {
        assert_eq!(to_key_part(&5u8).unwrap(), to_key_part(&5i64).unwrap());
        assert_eq!(to_key_part(&5u128).unwrap(), KeyPart::Int(5));
        assert_eq!(to_key_part(&u64::MAX).unwrap(), KeyPart::UInt(u64::MAX));
        assert!(to_key_part(&u128::MAX).is_err());
    }

    #[test]
    fn test_struct_becomes_sorted_map() {
        let part = to_key_part(&Query {
            path: "users".into(),
            limit: None,
        })
        .unwrap();

        assert_eq!(
            part,
            KeyPart::Map(vec![
                (KeyPart::Str("limit".into()), KeyPart::None),
                (KeyPart::Str("path".into()), KeyPart::Str("users".into())),
            ])
        );
    }

    #[test]
    fn test_enum_variants_are_tagged() {
        assert_eq!(to_key_part(&Shape::Empty).unwrap(), KeyPart::Str("Empty".into()));
        assert_ne!(
            to_key_part(&Shape::Circle(1.0)).unwrap(),
            to_key_part(&1.0f64).unwrap()
        );
        assert_ne!(
            to_key_part(&Shape::Rect { w: 1, h: 2 }).unwrap(),
            to_key_part(&Shape::Rect { w: 2, h: 1 }).unwrap()
        );
    }

    #[test]
    fn test_non_string_map_keys_are_kept() {
        let mut map = BTreeMap::new();
        map.insert((1u8, 2u8), 3u8);

        let part = to_key_part(&map).unwrap();

        assert_eq!(
            part,
            KeyPart::Map(vec![(
                KeyPart::Seq(vec![KeyPart::Int(1), KeyPart::Int(2)]),
                KeyPart::Int(3)
            )])
        );
    }
}

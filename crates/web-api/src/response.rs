use serde::{ser::SerializeMap, Serialize, Serializer};

/// `{ "success": true, "<key>": value }`
#[derive(Debug)]
pub struct Keyed<T> {
    key: &'static str,
    value: T,
}

pub fn keyed<T: Serialize>(key: &'static str, value: T) -> Keyed<T> {
    Keyed { key, value }
}

impl<T: Serialize> Serialize for Keyed<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("success", &true)?;
        map.serialize_entry(self.key, &self.value)?;
        map.end()
    }
}

/// 在对象型响应上追加 `success: true`
#[derive(Debug, Serialize)]
pub struct Merged<T> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

pub fn merged<T: Serialize>(body: T) -> Merged<T> {
    Merged {
        success: true,
        body,
    }
}

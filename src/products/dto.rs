use serde::Deserialize;
use serde_json::Value;

use crate::store::Document;

/// Fields a product update overwrites. Missing fields are stored as `null`.
#[derive(Debug, Deserialize)]
pub struct ProductUpdate {
    #[serde(rename = "productName")]
    pub product_name: Option<Value>,
    #[serde(rename = "productBrand")]
    pub product_brand: Option<Value>,
    #[serde(rename = "productUrl")]
    pub product_url: Option<Value>,
    #[serde(rename = "queryTitle")]
    pub query_title: Option<Value>,
    pub product_boycott: Option<Value>,
    pub date: Option<Value>,
    // older clients send the date under `data`; it wins over `date`
    pub data: Option<Value>,
}

impl ProductUpdate {
    pub fn into_fields(self) -> Document {
        let mut fields = Document::new();
        let mut set = |k: &str, v: Option<Value>| {
            fields.insert(k.to_string(), v.unwrap_or(Value::Null));
        };
        set("productName", self.product_name);
        set("productBrand", self.product_brand);
        set("productUrl", self.product_url);
        set("queryTitle", self.query_title);
        set("product_boycott", self.product_boycott);
        set("date", self.data.or(self.date));
        fields
    }
}

use compositor::BoundingBox;
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct LabeledBox {
    #[serde(flatten)]
    pub bbox: BoundingBox,
    pub class_id: usize,
}

#[derive(Serialize, Debug)]
pub struct JsonRecord {
    pub schema: &'static str,
    pub image: String,
    pub expression: String,
    pub size: u32,
    pub seed: u64,
    pub boxes: Vec<LabeledBox>,
}

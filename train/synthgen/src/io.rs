use std::{
    collections::HashMap,
    fs::File,
    io::{BufWriter, Error, Write},
    path::{Path, PathBuf},
};

use compositor::BoundingBox;
use image::{GrayImage, RgbImage};

use crate::record::{JsonRecord, LabeledBox};

/// Class ids in order of first appearance.
#[derive(Default, Debug)]
pub struct ClassMap {
    ids: HashMap<String, usize>,
    names: Vec<String>,
}

impl ClassMap {
    pub fn id(&mut self, label: &str) -> usize {
        if let Some(&id) = self.ids.get(label) {
            return id;
        }
        let id = self.names.len();
        self.ids.insert(label.to_string(), id);
        self.names.push(label.to_string());
        id
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

pub struct DatasetWriter {
    out_dir: PathBuf,
    writer: Option<BufWriter<File>>,
    classes: ClassMap,
}

impl DatasetWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            writer: None,
            classes: ClassMap::default(),
        }
    }

    pub fn init_output(&mut self, previews: bool) -> std::io::Result<()> {
        std::fs::create_dir_all(self.out_dir.join("images"))?;
        if previews {
            std::fs::create_dir_all(self.out_dir.join("previews"))?;
        }
        if self.writer.is_none() {
            let file = File::create(self.out_dir.join("labels.jsonl"))?;
            self.writer = Some(BufWriter::with_capacity(8 << 20, file));
        }
        Ok(())
    }

    pub fn image_rel(id: u32) -> String {
        format!("images/{id:06}.png")
    }

    pub fn save_png(&self, img: &GrayImage, id: u32) -> image::ImageResult<()> {
        img.save(self.out_dir.join(Self::image_rel(id)))
    }

    pub fn save_preview(&self, img: &RgbImage, id: u32) -> image::ImageResult<()> {
        img.save(
            Path::new(&self.out_dir)
                .join("previews")
                .join(format!("{id:06}.png")),
        )
    }

    pub fn write_record(
        &mut self,
        id: u32,
        seed: u64,
        expression: &str,
        size: u32,
        boxes: Vec<BoundingBox>,
    ) -> Result<(), Error> {
        let boxes = boxes
            .into_iter()
            .map(|bbox| LabeledBox {
                class_id: self.classes.id(&bbox.label),
                bbox,
            })
            .collect();
        let rec = JsonRecord {
            schema: "v1",
            image: Self::image_rel(id),
            expression: expression.to_string(),
            size,
            seed,
            boxes,
        };
        let json = serde_json::to_string(&rec)?;

        if let Some(ref mut writer) = self.writer {
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    /// Flushes the labels and writes `classes.txt`, one label per class id.
    pub fn finalize_output(&mut self) -> Result<(), Error> {
        if let Some(writer) = self.writer.take() {
            writer.into_inner()?.sync_all()?;
        }
        let mut classes = String::new();
        for name in self.classes.names() {
            classes.push_str(name);
            classes.push('\n');
        }
        std::fs::write(self.out_dir.join("classes.txt"), classes)
    }

    pub fn classes(&self) -> &ClassMap {
        &self.classes
    }
}

impl Drop for DatasetWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            let _ = writer.into_inner().map(|f| f.sync_all());
        }
    }
}

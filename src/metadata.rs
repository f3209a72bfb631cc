//! # Field Metadata
//!
//! Display labels and storage kinds for configuration fields, read from the
//! admin descriptor (`system.xml`). The descriptor is parsed once into a
//! lookup table keyed by `(group id, field id)`; rendering a row is then a
//! hash lookup instead of a file parse.
//!
//! ```text
//! <system>
//!   <section id="akeneo_connector">
//!     <group id="akeneo_api">
//!       <field id="client_secret">
//!         <label>Client secret</label>
//!         <backend_model>...</backend_model>
//!       </field>
//! ```

use std::collections::HashMap;
use std::path::Path;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{ReportError, Result};
use crate::model::{ConfigRow, FieldDescriptor, StorageKind};

/// Backend model marking a field whose value is a serialized record list.
pub const ARRAY_SERIALIZED_BACKEND: &str =
    "Magento\\Config\\Model\\Config\\Backend\\Serialized\\ArraySerialized";

/// Precomputed `(group, field) -> descriptor` table.
#[derive(Debug, Clone, Default)]
pub struct FieldMetadata {
    fields: HashMap<(String, String), FieldDescriptor>,
}

/// The field currently being read.
#[derive(Default)]
struct PendingField {
    group: String,
    id: String,
    label: String,
    backend_model: String,
}

impl PendingField {
    fn into_entry(self) -> ((String, String), FieldDescriptor) {
        let storage = if self.backend_model.trim() == ARRAY_SERIALIZED_BACKEND {
            StorageKind::SerializedArray
        } else {
            StorageKind::Plain
        };
        (
            (self.group, self.id),
            FieldDescriptor::new(self.label, storage),
        )
    }
}

impl FieldMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: &str, field: &str, descriptor: FieldDescriptor) {
        self.fields
            .insert((group.to_string(), field.to_string()), descriptor);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn from_xml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|e| {
            ReportError::lookup_with(
                format!("cannot read field descriptor '{}'", path.display()),
                e,
            )
        })?;
        let metadata = Self::from_xml_str(&xml)?;
        debug!(
            "loaded {} field descriptors from {}",
            metadata.len(),
            path.display()
        );
        Ok(metadata)
    }

    /// Parse a descriptor document. Later duplicates of a `(group, field)`
    /// pair replace earlier ones.
    pub fn from_xml_str(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut metadata = FieldMetadata::new();
        let mut stack: Vec<String> = Vec::new();
        let mut groups: Vec<String> = Vec::new();
        let mut field: Option<PendingField> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = element_name(&e);
                    match name.as_str() {
                        "group" => groups.push(get_attr(&e, "id").unwrap_or_default()),
                        "field" if stack.last().map(String::as_str) == Some("group") => {
                            field = Some(PendingField {
                                group: groups.last().cloned().unwrap_or_default(),
                                id: get_attr(&e, "id").unwrap_or_default(),
                                ..Default::default()
                            });
                        }
                        _ => {}
                    }
                    stack.push(name);
                }
                Event::Empty(e) => {
                    if element_name(&e) == "field"
                        && stack.last().map(String::as_str) == Some("group")
                    {
                        let (key, descriptor) = PendingField {
                            group: groups.last().cloned().unwrap_or_default(),
                            id: get_attr(&e, "id").unwrap_or_default(),
                            ..Default::default()
                        }
                        .into_entry();
                        metadata.fields.insert(key, descriptor);
                    }
                }
                Event::End(_) => {
                    match stack.pop().as_deref() {
                        Some("group") => {
                            groups.pop();
                        }
                        Some("field") if stack.last().map(String::as_str) == Some("group") => {
                            if let Some(pending) = field.take() {
                                let (key, descriptor) = pending.into_entry();
                                metadata.fields.insert(key, descriptor);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map_err(|e| ReportError::lookup(format!("bad descriptor text: {}", e)))?;
                    field_child_text(&stack, field.as_mut(), &text);
                }
                Event::CData(c) => {
                    let bytes = c.into_inner();
                    let text = String::from_utf8_lossy(&bytes);
                    field_child_text(&stack, field.as_mut(), &text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(metadata)
    }

    /// Descriptor for a config path. Unknown paths get an empty label and
    /// plain storage.
    pub fn resolve(&self, row: &ConfigRow) -> FieldDescriptor {
        let found = row
            .group_and_field()
            .and_then(|(group, field)| self.fields.get(&(group.to_string(), field.to_string())));
        match found {
            Some(descriptor) => descriptor.clone(),
            None => {
                warn!("no field descriptor for config path '{}'", row.path);
                FieldDescriptor::default()
            }
        }
    }

    pub fn label(&self, row: &ConfigRow) -> String {
        self.resolve(row).label
    }

    pub fn storage_kind(&self, row: &ConfigRow) -> StorageKind {
        self.resolve(row).storage
    }
}

/// Append text that belongs directly to the open field's `label` or
/// `backend_model` child.
fn field_child_text(stack: &[String], field: Option<&mut PendingField>, text: &str) {
    let Some(field) = field else { return };
    let n = stack.len();
    if n < 2 || stack[n - 2] != "field" {
        return;
    }
    match stack[n - 1].as_str() {
        "label" => field.label.push_str(text),
        "backend_model" => field.backend_model.push_str(text),
        _ => {}
    }
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

/// Helper to get an attribute value from a quick-xml BytesStart.
fn get_attr(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return String::from_utf8(attr.value.to_vec()).ok();
        }
    }
    None
}

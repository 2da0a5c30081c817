//! Class labels: weighting policy, label/index ordering and label sources.

pub mod class_order;
pub mod source;
pub mod weight;

use std::collections::HashMap;

/// Document title to class label. At most one label per document.
pub type LabelMap = HashMap<String, String>;

pub use class_order::ClassOrder;
pub use source::{LabelFileError, labels_from_metadata, parse_labels, read_labels};
pub use weight::LabelWeight;

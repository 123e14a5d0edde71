use crate::calendar::{color_for_preset, NormalizedCategory};
use crate::sync::graph_model::GraphCategory;
use std::collections::HashMap;

pub fn to_normalized_list(categories: &[GraphCategory]) -> Vec<NormalizedCategory> {
    categories
        .iter()
        .map(|category| NormalizedCategory {
            id: category.id.clone(),
            label: category.display_name.clone(),
            value: category.display_name.clone(),
            color: color_for_preset(&category.color).to_string(),
        })
        .collect()
}

/// Category label to color, as used to color listed events.
pub fn color_by_label(categories: &[NormalizedCategory]) -> HashMap<String, String> {
    categories
        .iter()
        .map(|c| (c.label.clone(), c.color.clone()))
        .collect()
}

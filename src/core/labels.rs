// File: src/core/labels.rs
//! Normalization of raw MultiWOZ annotations: known typos, slot/value
//! mismatches and out-of-ontology values are mapped to canonical values.
use crate::core::types::{BeliefMapping, BeliefRecord, SlotKey};

/// Value-level typos, applied to every ontology slot.
const GENERAL_TYPO: &[(&str, &str)] = &[
    // type
    ("guesthouse", "guest house"),
    ("guesthouses", "guest house"),
    ("guest", "guest house"),
    ("mutiple sports", "multiple sports"),
    ("sports", "multiple sports"),
    ("mutliple sports", "multiple sports"),
    ("swimmingpool", "swimming pool"),
    ("concerthall", "concert hall"),
    ("concert", "concert hall"),
    ("pool", "swimming pool"),
    ("night club", "nightclub"),
    ("mus", "museum"),
    ("ol", "architecture"),
    ("colleges", "college"),
    ("coll", "college"),
    ("architectural", "architecture"),
    ("musuem", "museum"),
    ("churches", "church"),
    // area
    ("center", "centre"),
    ("center of town", "centre"),
    ("near city center", "centre"),
    ("in the north", "north"),
    ("cen", "centre"),
    ("east side", "east"),
    ("east area", "east"),
    ("west part of town", "west"),
    ("ce", "centre"),
    ("town center", "centre"),
    ("centre of cambridge", "centre"),
    ("city center", "centre"),
    ("the south", "south"),
    ("scentre", "centre"),
    ("town centre", "centre"),
    ("in town", "centre"),
    ("north part of town", "north"),
    ("centre of town", "centre"),
    ("cb30aq", "none"),
    // price
    ("mode", "moderate"),
    ("moderate -ly", "moderate"),
    ("mo", "moderate"),
    // day
    ("next friday", "friday"),
    ("monda", "monday"),
    // parking
    ("free parking", "free"),
    // internet
    ("free internet", "yes"),
    // star
    ("4 star", "4"),
    ("4 stars", "4"),
    ("0 star rarting", "none"),
    // others
    ("y", "yes"),
    ("any", "dontcare"),
    ("n", "no"),
    ("does not care", "dontcare"),
    ("not men", "none"),
    ("not", "none"),
    ("not mentioned", "none"),
    ("", "none"),
    ("not mendtioned", "none"),
    ("3 .", "3"),
    ("does not", "no"),
    ("fun", "none"),
    ("art", "none"),
];

const HOTEL_TYPE_NONE: &[&str] = &[
    "nigh",
    "moderate -ly priced",
    "bed and breakfast",
    "centre",
    "venetian",
    "intern",
    "a cheap -er hotel",
];
const HOTEL_TYPE_HOTEL: &[&str] = &["hotel with free parking and free wifi", "4", "3 star hotel"];
const ATTRACTION_TYPE_NONE: &[&str] = &["gastropub", "la raza", "galleria", "gallery", "science", "m"];
const RESTAURANT_AREA_NONE: &[&str] = &["stansted airport", "cambridge", "silver street"];
const ATTRACTION_AREA_NONE: &[&str] = &["norwich", "ely", "museum", "same area as hotel"];

/// Builds a belief mapping from `belief_state` records and fixes the values
/// of every slot in `slots`. Slots outside `slots` are kept as annotated.
pub fn fix_general_label_error(records: &[BeliefRecord], slots: &[SlotKey]) -> BeliefMapping {
    let mut labels = BeliefMapping::new();
    for record in records {
        if let Some((key, value)) = record.slots.first() {
            labels.insert(key.clone(), value.clone());
        }
    }
    fix_label_values(&mut labels, slots);
    labels
}

/// Same as [`fix_general_label_error`] for `turn_label` pairs.
pub fn fix_turn_label_error(pairs: &[(SlotKey, String)], slots: &[SlotKey]) -> BeliefMapping {
    let mut labels: BeliefMapping = pairs.iter().cloned().collect();
    fix_label_values(&mut labels, slots);
    labels
}

fn fix_label_values(labels: &mut BeliefMapping, slots: &[SlotKey]) {
    for slot in slots {
        if let Some(value) = labels.get_mut(slot) {
            *value = fix_value(slot, value);
        }
    }
}

fn fix_value(slot: &str, value: &str) -> String {
    let value = GENERAL_TYPO
        .iter()
        .find(|(typo, _)| *typo == value)
        .map_or(value, |&(_, fixed)| fixed);

    let mismatched = (slot == "hotel-type" && HOTEL_TYPE_NONE.contains(&value))
        || (slot == "hotel-internet" && value == "4")
        || (slot == "hotel-pricerange" && value == "2")
        || (slot == "attraction-type" && ATTRACTION_TYPE_NONE.contains(&value))
        || (slot.contains("area") && value == "moderate")
        || (slot.contains("day") && value == "t");

    let value = if mismatched {
        "none"
    } else if slot == "hotel-type" && HOTEL_TYPE_HOTEL.contains(&value) {
        "hotel"
    } else if slot == "hotel-star" && value == "3 star hotel" {
        "3"
    } else if slot.contains("area") {
        match value {
            "no" => "north",
            "we" => "west",
            "cent" => "centre",
            other => other,
        }
    } else if slot.contains("day") {
        match value {
            "we" => "wednesday",
            "no" => "none",
            other => other,
        }
    } else if slot.contains("price") && value == "ch" {
        "cheap"
    } else if slot.contains("internet") && value == "free" {
        "yes"
    } else {
        value
    };

    let out_of_ontology = (slot == "restaurant-area" && RESTAURANT_AREA_NONE.contains(&value))
        || (slot == "attraction-area" && ATTRACTION_AREA_NONE.contains(&value));
    if out_of_ontology {
        "none".to_string()
    } else {
        value.to_string()
    }
}

/// Display names for the classes of the plastic detection model.
///
/// Keys are the class names the model was trained with, values are the
/// labels reported to users.
pub const DISPLAY_LABELS: [(&str, &str); 4] = [
    ("plastic_bottle", "Plastic Bottle"),
    ("plastic_bag", "Plastic Cover"),
    ("plastic_can", "Plastic Container"),
    ("combined_plastic", "Other Plastic Material"),
];

/// Look up the display label of a model class name.
pub fn display_label(class_name: &str) -> Option<&'static str> {
    DISPLAY_LABELS
        .iter()
        .find(|(name, _)| *name == class_name)
        .map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label() {
        assert_eq!(display_label("plastic_bag"), Some("Plastic Cover"));
        assert_eq!(display_label("plastic_can"), Some("Plastic Container"));
        assert_eq!(display_label("combined_plastic"), Some("Other Plastic Material"));
        assert_eq!(display_label("Plastic_Bottle"), None);
        assert_eq!(display_label("glass_bottle"), None);
    }
}

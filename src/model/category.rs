use serde::Serialize;

/// A category that expense transactions can be tagged with. The set of categories is fixed and is
/// not user data.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub struct CategoryDefinition {
    /// The key stored on a `TransactionRecord`.
    pub key: &'static str,
    /// The display name.
    pub name: &'static str,
    /// The chart color as `#RRGGBB`.
    pub color: &'static str,
    /// The name of the icon shown next to the category.
    pub icon: &'static str,
}

/// All known categories, in display order.
pub const CATEGORIES: &[CategoryDefinition] = &[
    CategoryDefinition {
        key: "purchases",
        name: "Compras",
        color: "#5636D3",
        icon: "shopping-bag",
    },
    CategoryDefinition {
        key: "food",
        name: "Alimentação",
        color: "#FF872C",
        icon: "coffee",
    },
    CategoryDefinition {
        key: "salary",
        name: "Salário",
        color: "#12A454",
        icon: "dollar-sign",
    },
    CategoryDefinition {
        key: "car",
        name: "Carro",
        color: "#E83F5B",
        icon: "crosshair",
    },
    CategoryDefinition {
        key: "leisure",
        name: "Lazer",
        color: "#26195C",
        icon: "heart",
    },
    CategoryDefinition {
        key: "studies",
        name: "Estudos",
        color: "#9C001A",
        icon: "book",
    },
];

/// Looks up a category by its key.
pub fn find_category(key: &str) -> Option<&'static CategoryDefinition> {
    CATEGORIES.iter().find(|c| c.key == key)
}

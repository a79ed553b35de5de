//! Per-category posting configuration: base price (INR) and free-post allowance.

pub struct CategoryForm {
    pub key: &'static str,
    pub name: &'static str,
    pub price: i64,
    pub free_posts: i64,
}

pub const CATEGORY_FORMS: &[CategoryForm] = &[
    CategoryForm { key: "ANIMAL", name: "Animals", price: 49, free_posts: 1 },
    CategoryForm { key: "BIRD", name: "Birds", price: 49, free_posts: 1 },
    CategoryForm { key: "TREE", name: "Trees", price: 49, free_posts: 1 },
    CategoryForm { key: "PADDY_RICE", name: "Paddy/Rice", price: 49, free_posts: 1 },
    CategoryForm { key: "VEGETABLE", name: "Vegetables", price: 29, free_posts: 1 },
    CategoryForm { key: "SEED", name: "Seeds", price: 29, free_posts: 1 },
    CategoryForm { key: "FRUIT", name: "Fruits", price: 49, free_posts: 1 },
    CategoryForm { key: "CAR", name: "Cars", price: 199, free_posts: 0 },
    CategoryForm { key: "BIKE", name: "Bikes", price: 99, free_posts: 0 },
    CategoryForm { key: "MACHINERY", name: "Machinery", price: 49, free_posts: 1 },
    CategoryForm { key: "PROPERTY", name: "Properties", price: 199, free_posts: 0 },
    CategoryForm { key: "ELECTRONICS", name: "Electronics", price: 49, free_posts: 1 },
    CategoryForm { key: "MOBILE", name: "Mobiles", price: 49, free_posts: 1 },
    CategoryForm { key: "FURNITURE", name: "Furniture", price: 49, free_posts: 1 },
    CategoryForm { key: "FASHION", name: "Fashion", price: 29, free_posts: 1 },
    CategoryForm { key: "JOB", name: "Jobs", price: 49, free_posts: 1 },
    CategoryForm { key: "PET", name: "Pets", price: 29, free_posts: 1 },
    CategoryForm { key: "MUSIC_INSTRUMENT", name: "Musical instruments", price: 29, free_posts: 1 },
    CategoryForm { key: "GYM_EQUIPMENT", name: "Gym & Fitness", price: 29, free_posts: 1 },
    CategoryForm { key: "FISH", name: "Fishes", price: 29, free_posts: 1 },
    CategoryForm { key: "VEHICLE", name: "Vehicle", price: 149, free_posts: 0 },
    CategoryForm { key: "SERVICE", name: "Other Services", price: 49, free_posts: 1 },
    CategoryForm { key: "SCRAP", name: "Scrap", price: 0, free_posts: 999 },
    CategoryForm { key: "SPORTS_ITEM", name: "Sports Items", price: 29, free_posts: 1 },
    CategoryForm { key: "BOOK", name: "Books", price: 0, free_posts: 999 },
];

/// Lookup by display name, case-insensitive.
pub fn category_form(name: &str) -> Option<&'static CategoryForm> {
    CATEGORY_FORMS
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(name))
}

pub fn category_form_by_key(key: &str) -> Option<&'static CategoryForm> {
    CATEGORY_FORMS.iter().find(|f| f.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(category_form("cars").unwrap().key, "CAR");
        assert_eq!(category_form("CARS").unwrap().price, 199);
    }

    #[test]
    fn unknown_category_is_none() {
        assert!(category_form("Spaceships").is_none());
        assert!(category_form_by_key("SPACESHIP").is_none());
    }

    #[test]
    fn paid_only_categories_have_no_free_posts() {
        for key in ["CAR", "BIKE", "PROPERTY", "VEHICLE"] {
            assert_eq!(category_form_by_key(key).unwrap().free_posts, 0);
        }
    }

    #[test]
    fn free_categories_cost_nothing() {
        assert_eq!(category_form("Books").unwrap().price, 0);
        assert_eq!(category_form("Scrap").unwrap().free_posts, 999);
    }
}

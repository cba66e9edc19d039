//! Heuristic cuisine labelling.
//!
//! Provider category tags are trusted first, then keywords in the place
//! name, then the generic fast-food tag. Table order is significant: the
//! first matching row wins.

use lazy_static::lazy_static;

pub const DEFAULT_CUISINE: &str = "Restaurant";
pub const FAST_FOOD: &str = "Fast Food";

/// Provider category tags that denote lodging rather than a restaurant.
pub const LODGING_TAGS: &[&str] = &[
    "lodging",
    "hotel",
    "motel",
    "hostel",
    "guest_house",
    "bed_and_breakfast",
    "resort_hotel",
    "extended_stay_hotel",
    "inn",
];

const FAST_FOOD_TAGS: &[&str] = &["meal_takeaway", "fast_food_restaurant"];

lazy_static! {
    static ref CATEGORY_TABLE: Vec<(&'static str, &'static str)> = vec![
        ("pizza_restaurant", "Pizzeria"),
        ("sushi_restaurant", "Sushi"),
        ("ramen_restaurant", "Giapponese"),
        ("italian_restaurant", "Italiano"),
        ("japanese_restaurant", "Giapponese"),
        ("chinese_restaurant", "Cinese"),
        ("indian_restaurant", "Indiano"),
        ("mexican_restaurant", "Messicano"),
        ("thai_restaurant", "Thailandese"),
        ("korean_restaurant", "Coreano"),
        ("mediterranean_restaurant", "Mediterraneo"),
        ("seafood_restaurant", "Seafood"),
        ("steak_house", "Steakhouse"),
        ("barbecue_restaurant", "BBQ"),
        ("hamburger_restaurant", "Burger"),
        ("sandwich_shop", "Panini"),
        ("vegan_restaurant", "Vegano"),
        ("vegetarian_restaurant", "Vegetariana"),
        ("cafe", "Caffè"),
        ("coffee_shop", "Caffè"),
        ("bar", "Bar"),
        ("bakery", "Dessert"),
    ];

    static ref KEYWORD_TABLE: Vec<(&'static [&'static str], &'static str)> = vec![
        (&["pizza"][..], "Pizzeria"),
        (&["sushi"][..], "Sushi"),
        (&["ramen", "udon", "izakaya"][..], "Giapponese"),
        (&["kebab", "shawarma", "doner", "döner"][..], "Kebab"),
        (&["burger"][..], "Burger"),
        (&["panini", "sandwich"][..], "Panini"),
        (&["steak"][..], "Steakhouse"),
        (&["bbq", "barbecue", "grill"][..], "BBQ"),
        (&["trattoria", "osteria"][..], "Trattoria"),
        (&["vegan"][..], "Vegano"),
        (&["vegetarian"][..], "Vegetariana"),
        (&["seafood", "fish", "pesce", "frutti di mare"][..], "Seafood"),
        (&["taco", "burrito", "mex"][..], "Messicano"),
        (&["curry", "tandoor"][..], "Indiano"),
        (&["pasta", "gnocchi"][..], "Italiano"),
        (&["dessert", "bakery", "pasticceria", "gelato", "gelateria"][..], "Dessert"),
        (&["cafe", "café", "caffè", "caffe", "coffee"][..], "Caffè"),
        (&["bar ", "pub"][..], "Bar"),
    ];
}

/// Derive a display cuisine label from a place name and its category tags.
pub fn classify(name: &str, categories: &[String]) -> String {
    if let Some(label) = CATEGORY_TABLE
        .iter()
        .find(|(tag, _)| categories.iter().any(|c| c == tag))
        .map(|(_, label)| *label)
    {
        return label.to_string();
    }

    let lower = name.to_lowercase();
    if let Some(label) = KEYWORD_TABLE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, label)| *label)
    {
        return label.to_string();
    }

    if categories.iter().any(|c| FAST_FOOD_TAGS.contains(&c.as_str())) {
        return FAST_FOOD.to_string();
    }

    DEFAULT_CUISINE.to_string()
}

pub fn is_lodging(categories: &[String]) -> bool {
    categories.iter().any(|c| LODGING_TAGS.contains(&c.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_category_beats_name() {
        let label = classify("Sushi Palace", &tags(&["restaurant", "italian_restaurant"]));
        assert_eq!(label, "Italiano");
    }

    #[test]
    fn test_specific_category_beats_generic_one() {
        let label = classify("Somewhere", &tags(&["bar", "restaurant", "thai_restaurant"]));
        assert_eq!(label, "Thailandese");
    }

    #[test]
    fn test_name_keywords() {
        let generic = tags(&["restaurant", "food"]);
        assert_eq!(classify("Pizzeria Starita", &generic), "Pizzeria");
        assert_eq!(classify("Kebab House", &generic), "Kebab");
        assert_eq!(classify("Osteria del Porto", &generic), "Trattoria");
        assert_eq!(classify("Bar Nilo", &generic), "Bar");
        assert_eq!(classify("The Old Pub", &generic), "Bar");
        assert_eq!(classify("Gran Caffè Gambrinus", &generic), "Caffè");
        assert_eq!(classify("Taqueria Mex", &generic), "Messicano");
    }

    #[test]
    fn test_keyword_order_matters() {
        // "pasta" appears later than "sushi" in the keyword table
        let generic = tags(&["restaurant"]);
        assert_eq!(classify("Sushi & Pasta", &generic), "Sushi");
        assert_eq!(classify("Pizza e Pasta", &generic), "Pizzeria");
    }

    #[test]
    fn test_barbecue_is_not_a_bar() {
        assert_eq!(classify("Smokey Barbecue", &tags(&["restaurant"])), "BBQ");
    }

    #[test]
    fn test_fast_food_then_default() {
        assert_eq!(classify("Quick Stop", &tags(&["meal_takeaway"])), "Fast Food");
        assert_eq!(classify("Da Nennella", &tags(&["restaurant"])), "Restaurant");
        assert_eq!(classify("", &[]), "Restaurant");
    }

    #[test]
    fn test_lodging_detection() {
        assert!(is_lodging(&tags(&["lodging", "restaurant"])));
        assert!(is_lodging(&tags(&["bed_and_breakfast"])));
        assert!(!is_lodging(&tags(&["restaurant", "food"])));
    }
}

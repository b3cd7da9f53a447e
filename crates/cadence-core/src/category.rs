//! Categories group habits for display.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub category_id: Uuid,
  pub name:        String,
  /// Icon name from the client's icon set.
  pub icon:        String,
  pub color:       String,
  /// `false` for the stock categories every store is seeded with.
  pub is_custom:   bool,
}

impl Category {
  /// A user-defined category with a fresh id.
  pub fn custom(name: String, icon: String, color: String) -> Self {
    Self {
      category_id: Uuid::new_v4(),
      name,
      icon,
      color,
      is_custom: true,
    }
  }
}

/// `(name, icon, color)` of the categories a new store starts with.
const STOCK: [(&str, &str, &str); 15] = [
  ("Quit a bad habit", "block-helper", "darkred"),
  ("Art", "brush", "crimson"),
  ("Task", "clock-outline", "orangered"),
  ("Meditation", "meditation", "darkorange"),
  ("Study", "school", "goldenrod"),
  ("Sports", "bike", "cornflowerblue"),
  ("Entertainment", "ticket", "dodgerblue"),
  ("Social", "android-messages", "deepskyblue"),
  ("Finance", "piggy-bank", "darkturquoise"),
  ("Health", "hospital", "cadetblue"),
  ("Work", "briefcase", "goldenrod"),
  ("Nutrition", "silverware-variant", "rosybrown"),
  ("Home", "home", "teal"),
  ("Outdoor", "terrain", "yellowgreen"),
  ("Other", "apps", "slateblue"),
];

/// Fresh copies of the stock categories, each with a new id.
pub fn stock_categories() -> Vec<Category> {
  STOCK
    .iter()
    .map(|&(name, icon, color)| Category {
      category_id: Uuid::new_v4(),
      name:        name.to_owned(),
      icon:        icon.to_owned(),
      color:       color.to_owned(),
      is_custom:   false,
    })
    .collect()
}

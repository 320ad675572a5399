//! Fixed product catalog: picker categories, gender fits, and gallery samples

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A garment category offered in the picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub title: &'static str,
    pub image: &'static str,
}

impl Category {
    /// Image used when the bundled asset fails to load
    pub fn fallback_image(&self) -> String {
        format!("https://picsum.photos/seed/{}/1200/900", self.id)
    }
}

/// The six picker categories, in display order
pub const CATEGORIES: [Category; 6] = [
    Category { id: "round", title: "Classic Crew Tee", image: "/images/round.jpg" },
    Category { id: "polo", title: "Smart Polo", image: "/images/polo.jpg" },
    Category { id: "varsity", title: "Varsity Jacket", image: "/images/varsity.jpg" },
    Category { id: "hoodie", title: "Cozy Hoodie", image: "/images/hoodie.jpg" },
    Category { id: "jersey", title: "Team Jersey", image: "/images/jersey.jpg" },
    Category { id: "custom", title: "Design Your Own", image: "/images/your%20own%20category.jpg" },
];

/// Look up a category by id (exact) or title (case-insensitive)
pub fn find_category(key: &str) -> Option<&'static Category> {
    let key = key.trim();
    CATEGORIES
        .iter()
        .find(|c| c.id == key || c.title.eq_ignore_ascii_case(key))
}

/// Who the garment is cut for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GenderOption {
    Male,
    Female,
    Unisex,
}

impl GenderOption {
    pub const ALL: [GenderOption; 3] = [GenderOption::Male, GenderOption::Female, GenderOption::Unisex];

    #[inline]
    pub fn label(&self) -> &'static str {
        match self {
            GenderOption::Male => "Male",
            GenderOption::Female => "Female",
            GenderOption::Unisex => "Unisex",
        }
    }
}

impl fmt::Display for GenderOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown gender option '{0}'")]
pub struct UnknownGender(pub String);

impl FromStr for GenderOption {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        GenderOption::ALL
            .into_iter()
            .find(|g| g.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownGender(s.to_string()))
    }
}

/// Garment type used to filter the gallery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentType {
    Tshirt,
    Varsity,
    Jersey,
    Custom,
}

impl GarmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GarmentType::Tshirt => "tshirt",
            GarmentType::Varsity => "varsity",
            GarmentType::Jersey => "jersey",
            GarmentType::Custom => "custom",
        }
    }
}

/// A sample piece shown in the gallery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GalleryItem {
    pub id: &'static str,
    pub title: &'static str,
    #[serde(rename = "type")]
    pub kind: GarmentType,
    pub image: &'static str,
}

pub const GALLERY: [GalleryItem; 6] = [
    GalleryItem {
        id: "t1",
        title: "Minimal Custom Tee",
        kind: GarmentType::Tshirt,
        image: "https://images.unsplash.com/photo-1520975916090-3105956dac38?q=80&w=1200&auto=format&fit=crop",
    },
    GalleryItem {
        id: "t2",
        title: "Bold Print Tee",
        kind: GarmentType::Tshirt,
        image: "https://images.unsplash.com/photo-1541099649105-f69ad21f3246?q=80&w=1200&auto=format&fit=crop",
    },
    GalleryItem {
        id: "v1",
        title: "Classic Varsity Jacket",
        kind: GarmentType::Varsity,
        image: "https://images.unsplash.com/photo-1541534401786-2077eed87a6f?q=80&w=1200&auto=format&fit=crop",
    },
    GalleryItem {
        id: "j1",
        title: "Team Jersey",
        kind: GarmentType::Jersey,
        image: "https://images.unsplash.com/photo-1546519638-68e109498ffc?q=80&w=1200&auto=format&fit=crop",
    },
    GalleryItem {
        id: "c1",
        title: "Custom Hoodie",
        kind: GarmentType::Custom,
        image: "https://images.unsplash.com/photo-1503342452485-86ff0a2c5ec7?q=80&w=1200&auto=format&fit=crop",
    },
    GalleryItem {
        id: "c2",
        title: "Special Edition",
        kind: GarmentType::Custom,
        image: "https://images.unsplash.com/photo-1516826957135-700dedea698c?q=80&w=1200&auto=format&fit=crop",
    },
];

/// Gallery filter chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GalleryFilter {
    #[default]
    All,
    Only(GarmentType),
}

impl GalleryFilter {
    pub const CHIPS: [GalleryFilter; 5] = [
        GalleryFilter::All,
        GalleryFilter::Only(GarmentType::Tshirt),
        GalleryFilter::Only(GarmentType::Varsity),
        GalleryFilter::Only(GarmentType::Jersey),
        GalleryFilter::Only(GarmentType::Custom),
    ];

    /// Chip label: "All", or the type name capitalized
    pub fn label(&self) -> String {
        match self {
            GalleryFilter::All => "All".to_string(),
            GalleryFilter::Only(kind) => {
                let s = kind.as_str();
                let mut chars = s.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            }
        }
    }

    pub fn matches(&self, item: &GalleryItem) -> bool {
        match self {
            GalleryFilter::All => true,
            GalleryFilter::Only(kind) => item.kind == *kind,
        }
    }

    /// Gallery items visible under this filter, in catalog order
    pub fn apply(&self) -> Vec<&'static GalleryItem> {
        GALLERY.iter().filter(|item| self.matches(item)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown gallery filter '{0}'")]
pub struct UnknownGalleryFilter(pub String);

impl FromStr for GalleryFilter {
    type Err = UnknownGalleryFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(GalleryFilter::All),
            "tshirt" => Ok(GalleryFilter::Only(GarmentType::Tshirt)),
            "varsity" => Ok(GalleryFilter::Only(GarmentType::Varsity)),
            "jersey" => Ok(GalleryFilter::Only(GarmentType::Jersey)),
            "custom" => Ok(GalleryFilter::Only(GarmentType::Custom)),
            other => Err(UnknownGalleryFilter(other.to_string())),
        }
    }
}

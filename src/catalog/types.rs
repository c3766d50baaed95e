/// Item (type) and group identifiers as they appear in the SDE and killmails.
pub type TypeId = i32;

/// Group category, reduced to the codes fitting extraction cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Ship,
    Module,
    Charge,
    Subsystem,
    Other(i32),
}

impl Category {
    pub const SHIP: i32 = 6;
    pub const MODULE: i32 = 7;
    pub const CHARGE: i32 = 8;
    pub const SUBSYSTEM: i32 = 32;

    /// Every category with a named variant
    pub const KNOWN: [Category; 4] = [
        Category::Ship,
        Category::Module,
        Category::Charge,
        Category::Subsystem,
    ];

    pub fn from_code(code: i32) -> Self {
        match code {
            Self::SHIP => Category::Ship,
            Self::MODULE => Category::Module,
            Self::CHARGE => Category::Charge,
            Self::SUBSYSTEM => Category::Subsystem,
            other => Category::Other(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Category::Ship => Self::SHIP,
            Category::Module => Self::MODULE,
            Category::Charge => Self::CHARGE,
            Category::Subsystem => Self::SUBSYSTEM,
            Category::Other(code) => *code,
        }
    }

    /// Whether catalog loading keeps groups of this category
    pub fn is_fittable(&self) -> bool {
        !matches!(self, Category::Other(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: TypeId,
    pub name: String,
    pub lower: String,
    pub group_id: TypeId,
}

impl CatalogItem {
    pub fn new(id: TypeId, name: impl Into<String>, group_id: TypeId) -> Self {
        let name = name.into();
        Self {
            id,
            lower: name.to_lowercase(),
            name,
            group_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogGroup {
    pub id: TypeId,
    pub name: String,
    pub lower: String,
    pub category: Category,
}

impl CatalogGroup {
    pub fn new(id: TypeId, name: impl Into<String>, category: Category) -> Self {
        let name = name.into();
        Self {
            id,
            lower: name.to_lowercase(),
            name,
            category,
        }
    }

    pub fn is_charge(&self) -> bool {
        self.category == Category::Charge
    }
}

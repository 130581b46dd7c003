//! Admin resources exposed by the backend

use serde::Serialize;

/// A CRUD collection under the admin namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Product,
    Category,
    Collection,
    Discount,
    Order,
    User,
    AdminLog,
}

impl Resource {
    #[cfg(test)]
    pub const ALL: [Resource; 7] = [
        Resource::Product,
        Resource::Category,
        Resource::Collection,
        Resource::Discount,
        Resource::Order,
        Resource::User,
        Resource::AdminLog,
    ];

    /// Collection path, relative to the API prefix
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Product => "/products",
            Resource::Category => "/categories",
            Resource::Collection => "/collections",
            Resource::Discount => "/discounts",
            Resource::Order => "/orders",
            Resource::User => "/users",
            Resource::AdminLog => "/logs",
        }
    }

    /// Path of a single item
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path(), id)
    }

    /// Singular display name
    pub fn label(&self) -> &'static str {
        match self {
            Resource::Product => "product",
            Resource::Category => "category",
            Resource::Collection => "collection",
            Resource::Discount => "discount",
            Resource::Order => "order",
            Resource::User => "user",
            Resource::AdminLog => "admin log",
        }
    }

    /// Admin logs are an audit trail and cannot be written
    pub fn is_read_only(&self) -> bool {
        matches!(self, Resource::AdminLog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_unique() {
        let mut paths: Vec<_> = Resource::ALL.iter().map(|r| r.path()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), Resource::ALL.len());
    }

    #[test]
    fn test_item_path() {
        assert_eq!(Resource::Product.item_path("p-1"), "/products/p-1");
        assert_eq!(Resource::AdminLog.item_path("9"), "/logs/9");
    }

    #[test]
    fn test_only_logs_read_only() {
        let read_only: Vec<_> = Resource::ALL.iter().filter(|r| r.is_read_only()).collect();
        assert_eq!(read_only, vec![&Resource::AdminLog]);
    }
}

mod contact_cache;

pub use contact_cache::ContactCache;

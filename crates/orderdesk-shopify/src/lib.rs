pub mod client;
pub mod error;
pub mod normalize;
pub mod pagination;
pub mod rate_limit;
pub mod types;

pub use client::{
    extract_store_origin, graphql_url, orders_url, LocationLookup, OrderFilters, OrderPages,
    OrdersPage, ResolvedLocation, ShopifyClient, MAX_PAGES,
};
pub use error::ShopifyError;
pub use normalize::{
    ineligibility_reason, line_item_gid, normalize_order, normalize_order_number,
    parse_line_item_gid, strip_location_gid,
};
pub use pagination::{extract_next_url, CallLimit};
pub use rate_limit::{RateLimiter, DEFAULT_MIN_INTERVAL};
pub use types::{ShopifyCustomer, ShopifyLineItem, ShopifyOrder, ShopifyOrdersResponse};

//! Types returned by and passed to the repositories.

pub mod account;
pub mod catalog;
pub mod content;
pub mod order;
pub mod settings;

pub use account::{AdminCredentials, AdminUser, User, UserCredentials, UserSummary};
pub use catalog::{
    CartVariant, Category, CategoryInput, Collection, CollectionInput, Facets, ImageInput,
    LowStockVariant, Product, ProductDetail, ProductFilter, ProductImage, ProductInput,
    ProductSort, ProductSummary, Variant, VariantInput,
};
pub use content::{Banner, BannerInput, Faq, FaqInput, Page, PageInput};
pub use order::{
    Coupon, CouponInput, DashboardStats, NewOrder, NewOrderLine, Order, OrderDetail, OrderItem,
    OrderSummary, PlaceOrderError, PlacedOrder, ShipmentInfo, StatusHistoryEntry,
    StatusUpdateError,
};
pub use settings::StoreSettings;

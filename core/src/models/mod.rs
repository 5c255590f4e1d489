// core/src/models/mod.rs

//! Domain records of the ticketing core.

pub mod cart;
pub mod money;
pub mod order;
pub mod stock_unit;
pub mod ticket;

pub use cart::{Cart, CartItem, CartLine, CartView};
pub use money::Money;
pub use order::{BillingAddress, Order, OrderDetail, OrderItem, OrderStatus, Page, PaymentDetails};
pub use stock_unit::{NewStockUnit, SaleWindow, StockStatus, StockUnit, StockUnitChanges};
pub use ticket::{Ticket, TicketDraft, TicketFilter, TicketStatus};

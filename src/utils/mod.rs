pub mod html;
pub mod qr_payload;

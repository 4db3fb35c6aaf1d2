/// 定時抓取附近加油站油價並寫入歷史檔
pub mod fuel_price;

pub mod ara;

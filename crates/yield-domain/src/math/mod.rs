pub mod fee_growth;

//! Column names of the sales dataset and the fixed column subsets the
//! dashboard reads.

pub const ORDERNUMBER: &str = "ORDERNUMBER";
pub const ORDERDATE: &str = "ORDERDATE";
pub const CUSTOMERNAME: &str = "CUSTOMERNAME";
pub const COUNTRY: &str = "COUNTRY";
pub const PRODUCTLINE: &str = "PRODUCTLINE";
pub const DEALSIZE: &str = "DEALSIZE";
pub const SALES: &str = "SALES";
pub const QUANTITYORDERED: &str = "QUANTITYORDERED";
pub const PRICEEACH: &str = "PRICEEACH";
pub const MSRP: &str = "MSRP";
pub const YEAR_ID: &str = "YEAR_ID";

/// Every column the loader insists on.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    ORDERDATE,
    SALES,
    QUANTITYORDERED,
    PRICEEACH,
    MSRP,
    CUSTOMERNAME,
    COUNTRY,
    PRODUCTLINE,
    DEALSIZE,
    YEAR_ID,
    ORDERNUMBER,
];

pub const INTEGER_COLUMNS: [&str; 3] = [ORDERNUMBER, QUANTITYORDERED, YEAR_ID];
pub const FLOAT_COLUMNS: [&str; 3] = [SALES, PRICEEACH, MSRP];
pub const TEXT_COLUMNS: [&str; 4] = [CUSTOMERNAME, COUNTRY, PRODUCTLINE, DEALSIZE];

/// Columns shown in the data preview table, in display order.
pub const PREVIEW_COLUMNS: [&str; 7] = [
    ORDERNUMBER,
    ORDERDATE,
    CUSTOMERNAME,
    PRODUCTLINE,
    SALES,
    QUANTITYORDERED,
    COUNTRY,
];

/// Columns covered by the numerical summary table.
pub const SUMMARY_COLUMNS: [&str; 4] = [SALES, QUANTITYORDERED, PRICEEACH, MSRP];

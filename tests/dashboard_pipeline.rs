use sales_dashboard::aggregate;
use sales_dashboard::data_utils::{i64_values, string_values};
use sales_dashboard::{
    load, load_uncached, DashboardError, Dimension, FilterEngine, FilterState, SalesTable,
};
use std::collections::{BTreeSet, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const COUNTRIES: [&str; 5] = ["USA", "France", "Norway", "Spain", "Japan"];
const PRODUCT_LINES: [&str; 7] = [
    "Classic Cars",
    "Motorcycles",
    "Planes",
    "Ships",
    "Trains",
    "Trucks and Buses",
    "Vintage Cars",
];
const CUSTOMERS: [&str; 15] = [
    "Land of Toys Inc.",
    "Reims Collectables",
    "Lyon Souveniers",
    "Toys4GrownUps.com",
    "Corporate Gift Ideas Co.",
    "Technics Stores Inc.",
    "Daedalus Designs Imports",
    "Herkku Gifts",
    "Mini Gifts Distributors, Ltd.",
    "Euro Shopping Channel",
    "Auto Canal Petit",
    "Baane Mini Imports",
    "Diecast Classics Inc.",
    "Vitachrome Inc.",
    "Online Diecast Creations Co.",
];

/// One generated order line, kept alongside the CSV so tests can compute
/// expectations independently of the pipeline.
#[derive(Debug, Clone)]
struct Line {
    order: i64,
    line: i64,
    year: i64,
    month: u32,
    country: &'static str,
    product_line: &'static str,
    customer: &'static str,
    deal_size: &'static str,
    quantity: i64,
    sales: f64,
}

fn generate_lines(n: usize) -> Vec<Line> {
    (0..n)
        .map(|i| {
            let quantity = 20 + (i * 13 % 30) as i64;
            let price = 50.0 + (i * 17 % 50) as f64 + 0.25;
            let sales = quantity as f64 * price;
            Line {
                order: 10100 + (i / 3) as i64,
                line: (i % 3) as i64 + 1,
                year: 2003 + (i % 3) as i64,
                month: (i * 7 % 12) as u32 + 1,
                country: COUNTRIES[i % COUNTRIES.len()],
                product_line: PRODUCT_LINES[(i / 2) % PRODUCT_LINES.len()],
                customer: CUSTOMERS[(i * 11) % CUSTOMERS.len()],
                deal_size: if sales < 3000.0 {
                    "Small"
                } else if sales < 7000.0 {
                    "Medium"
                } else {
                    "Large"
                },
                quantity,
                sales,
            }
        })
        .collect()
}

fn write_csv(dir: &Path, lines: &[Line]) -> PathBuf {
    let path = dir.join("sales_data_sample.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "ORDERNUMBER,QUANTITYORDERED,PRICEEACH,ORDERLINENUMBER,SALES,ORDERDATE,YEAR_ID,PRODUCTLINE,MSRP,CUSTOMERNAME,COUNTRY,DEALSIZE"
    )
    .unwrap();
    for (i, l) in lines.iter().enumerate() {
        let price = l.sales / l.quantity as f64;
        writeln!(
            file,
            "{},{},{},{},{},{}/{}/{} 0:00,{},{},{},\"{}\",{},{}",
            l.order,
            l.quantity,
            price,
            l.line,
            l.sales,
            l.month,
            (i % 28) + 1,
            l.year,
            l.year,
            l.product_line,
            price.round() as i64 + 10,
            l.customer,
            l.country,
            l.deal_size
        )
        .unwrap();
    }
    path
}

fn fixture() -> (tempfile::TempDir, Vec<Line>, Arc<SalesTable>) {
    let dir = tempfile::tempdir().unwrap();
    let lines = generate_lines(240);
    let path = write_csv(dir.path(), &lines);
    let table = load(&path).unwrap();
    (dir, lines, table)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6 * b.abs().max(1.0)
}

fn line_matches(line: &Line, state: &FilterState) -> bool {
    let check = |dim: Dimension, value: String| {
        state.selected(dim).map_or(true, |s| s.contains(&value))
    };
    check(Dimension::Year, line.year.to_string())
        && check(Dimension::Country, line.country.to_string())
        && check(Dimension::ProductLine, line.product_line.to_string())
        && check(Dimension::DealSize, line.deal_size.to_string())
}

fn selection_grid() -> Vec<FilterState> {
    let years: [&[&str]; 3] = [&[], &["2004"], &["2003", "2005"]];
    let countries: [&[&str]; 3] = [&[], &["USA"], &["France", "Japan"]];
    let product_lines: [&[&str]; 3] = [&[], &["Ships"], &["Planes", "Vintage Cars", "Trains"]];

    let mut states = Vec::new();
    for y in years {
        for c in countries {
            for p in product_lines {
                let mut state = FilterState::new();
                state
                    .select(Dimension::Year, y.iter().copied())
                    .select(Dimension::Country, c.iter().copied())
                    .select(Dimension::ProductLine, p.iter().copied());
                states.push(state);
            }
        }
    }
    states
}

#[test]
fn test_load_returns_cached_table() {
    let (dir, lines, table) = fixture();
    assert_eq!(table.height(), lines.len());

    let again = load(dir.path().join("sales_data_sample.csv")).unwrap();
    assert!(Arc::ptr_eq(&table, &again));

    // The uncached path reads a fresh copy.
    let fresh = load_uncached(dir.path().join("sales_data_sample.csv")).unwrap();
    assert_eq!(fresh.height(), table.height());
    assert!(fresh.source().is_some());
}

#[test]
fn test_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = load(dir.path().join("nope.xls")).unwrap_err();
    assert!(matches!(err, DashboardError::Io(_)));
}

#[test]
fn test_missing_column_fails_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.csv");
    std::fs::write(&path, "ORDERNUMBER,SALES\n1,2.0\n").unwrap();
    assert!(matches!(
        load_uncached(&path),
        Err(DashboardError::MissingColumn(_))
    ));
}

#[test]
fn test_year_and_country_example() {
    let (_dir, lines, table) = fixture();
    let state = FilterState::from_query_pairs(vec![("YEAR_ID", "2004"), ("COUNTRY", "USA")]).unwrap();

    let view = FilterEngine::filter_df(&table, &state).unwrap();
    let years = i64_values(view.frame(), "YEAR_ID").unwrap();
    let countries = string_values(view.frame(), "COUNTRY").unwrap();
    assert!(years.iter().all(|y| *y == Some(2004)));
    assert!(countries.iter().all(|c| c.as_deref() == Some("USA")));

    let expected: Vec<&Line> = lines
        .iter()
        .filter(|l| l.year == 2004 && l.country == "USA")
        .collect();
    assert!(!expected.is_empty());
    assert_eq!(view.height(), expected.len());

    let kpis = aggregate::kpis(&view).unwrap();
    let expected_sales: f64 = expected.iter().map(|l| l.sales).sum();
    assert!(close(kpis.total_sales, expected_sales));
    let expected_quantity: i64 = expected.iter().map(|l| l.quantity).sum();
    assert_eq!(kpis.total_quantity, expected_quantity);
    let expected_orders: HashSet<i64> = expected.iter().map(|l| l.order).collect();
    assert_eq!(kpis.total_orders, expected_orders.len());
}

#[test]
fn test_filtered_view_is_subset_satisfying_predicates() {
    let (_dir, lines, table) = fixture();
    let all_keys: HashSet<(i64, i64)> = lines.iter().map(|l| (l.order, l.line)).collect();

    for state in selection_grid() {
        let view = FilterEngine::filter_df(&table, &state).unwrap();
        let orders = i64_values(view.frame(), "ORDERNUMBER").unwrap();
        let line_numbers = i64_values(view.frame(), "ORDERLINENUMBER").unwrap();

        let view_keys: HashSet<(i64, i64)> = orders
            .iter()
            .zip(&line_numbers)
            .map(|(o, l)| (o.unwrap(), l.unwrap()))
            .collect();
        assert!(view_keys.is_subset(&all_keys));

        let expected: HashSet<(i64, i64)> = lines
            .iter()
            .filter(|l| line_matches(l, &state))
            .map(|l| (l.order, l.line))
            .collect();
        assert_eq!(view_keys, expected, "selection {:?}", state);
        assert_eq!(view.height(), expected.len());
    }
}

#[test]
fn test_group_sums_equal_view_total() {
    let (_dir, _lines, table) = fixture();

    for state in selection_grid() {
        let view = FilterEngine::filter_df(&table, &state).unwrap();
        let total = aggregate::kpis(&view).unwrap().total_sales;

        for dim in Dimension::ALL {
            let groups = aggregate::sales_by(&view, dim).unwrap();
            let sum: f64 = groups.iter().map(|g| g.sales).sum();
            assert!(close(sum, total), "{} groups sum {} != {}", dim, sum, total);
        }

        let by_year: f64 = aggregate::sales_by_year(&view)
            .unwrap()
            .iter()
            .map(|y| y.total_sales)
            .sum();
        assert!((by_year - total).abs() < 0.01 * 3.0);

        let trend: f64 = aggregate::monthly_trend(&view).unwrap().iter().map(|p| p.sales).sum();
        assert!(close(trend, total));

        let customers: f64 = aggregate::top_customers(&view, usize::MAX)
            .unwrap()
            .iter()
            .map(|c| c.sales)
            .sum();
        assert!(close(customers, total));
    }
}

#[test]
fn test_top_ten_customers_sorted_descending() {
    let (_dir, _lines, table) = fixture();

    for state in selection_grid() {
        let view = FilterEngine::filter_df(&table, &state).unwrap();
        let top = aggregate::top_customers(&view, 10).unwrap();
        assert!(top.len() <= 10);
        for pair in top.windows(2) {
            assert!(pair[0].sales >= pair[1].sales);
        }
    }

    let everyone = FilterEngine::filter_df(&table, &FilterState::new()).unwrap();
    assert_eq!(aggregate::top_customers(&everyone, 10).unwrap().len(), 10);
}

#[test]
fn test_monthly_trend_one_point_per_month() {
    let (_dir, lines, table) = fixture();

    for state in selection_grid() {
        let view = FilterEngine::filter_df(&table, &state).unwrap();
        let trend = aggregate::monthly_trend(&view).unwrap();

        let expected: BTreeSet<(i64, i64)> = lines
            .iter()
            .filter(|l| line_matches(l, &state))
            .map(|l| (l.year, l.month as i64))
            .collect();
        let got: Vec<(i64, i64)> = trend.iter().map(|p| (p.year, p.month)).collect();
        // BTreeSet iteration is chronological, so equality also checks order.
        assert_eq!(got, expected.into_iter().collect::<Vec<_>>());
    }
}

#[test]
fn test_cascading_options_follow_other_selections() {
    let (_dir, lines, table) = fixture();
    let mut state = FilterState::new();
    state.select(Dimension::Year, ["2003"]);

    let options =
        FilterEngine::allowed_values(&table, &state, &Dimension::DEFAULT_FILTERS).unwrap();

    let expected_countries: BTreeSet<String> = lines
        .iter()
        .filter(|l| l.year == 2003)
        .map(|l| l.country.to_string())
        .collect();
    let countries: BTreeSet<String> = options[1].options.iter().cloned().collect();
    assert_eq!(countries, expected_countries);

    // The year widget still lists every year.
    assert_eq!(options[0].options, vec!["2003", "2004", "2005"]);
    assert_eq!(options[0].selected, vec!["2003"]);
}

#[test]
fn test_quoted_customer_names_survive_loading() {
    let (_dir, _lines, table) = fixture();
    let names = string_values(table.frame(), "CUSTOMERNAME").unwrap();
    assert!(names
        .iter()
        .any(|n| n.as_deref() == Some("Mini Gifts Distributors, Ltd.")));
}

fn write_xlsx(dir: &Path, lines: &[Line]) -> PathBuf {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    let header = [
        "ORDERNUMBER",
        "QUANTITYORDERED",
        "PRICEEACH",
        "SALES",
        "ORDERDATE",
        "YEAR_ID",
        "PRODUCTLINE",
        "MSRP",
        "CUSTOMERNAME",
        "COUNTRY",
        "DEALSIZE",
    ];
    for (col, name) in header.iter().enumerate() {
        worksheet.write_string(0, col as u16, *name).unwrap();
    }

    for (i, l) in lines.iter().enumerate() {
        let row = (i + 1) as u32;
        let price = l.sales / l.quantity as f64;
        // ORDERDATE as a bare Excel serial day number.
        let serial = 37622.0 + i as f64;
        worksheet.write_number(row, 0, l.order as f64).unwrap();
        worksheet.write_number(row, 1, l.quantity as f64).unwrap();
        worksheet.write_number(row, 2, price).unwrap();
        worksheet.write_number(row, 3, l.sales).unwrap();
        worksheet.write_number(row, 4, serial).unwrap();
        worksheet.write_number(row, 5, l.year as f64).unwrap();
        worksheet.write_string(row, 6, l.product_line).unwrap();
        worksheet.write_number(row, 7, price.round() + 10.0).unwrap();
        worksheet.write_string(row, 8, l.customer).unwrap();
        worksheet.write_string(row, 9, l.country).unwrap();
        worksheet.write_string(row, 10, l.deal_size).unwrap();
    }

    let path = dir.join("sales_data_sample.xlsx");
    std::fs::write(&path, workbook.save_to_buffer().unwrap()).unwrap();
    path
}

#[test]
fn test_xlsx_workbook_loads_and_filters() {
    let dir = tempfile::tempdir().unwrap();
    let lines = generate_lines(30);
    let path = write_xlsx(dir.path(), &lines);

    let table = load(&path).unwrap();
    assert_eq!(table.height(), lines.len());

    let orders = i64_values(table.frame(), "ORDERNUMBER").unwrap();
    let expected: Vec<Option<i64>> = lines.iter().map(|l| Some(l.order)).collect();
    assert_eq!(orders, expected);

    // 37622 is 2003-01-01; one day per row.
    let trend = aggregate::monthly_trend(&FilterEngine::filter_df(&table, &FilterState::new()).unwrap())
        .unwrap();
    assert_eq!(trend.len(), 1);
    assert_eq!(trend[0].label, "2003-01");

    let state = FilterState::from_query_pairs(vec![("COUNTRY", "Japan")]).unwrap();
    let view = FilterEngine::filter_df(&table, &state).unwrap();
    let expected_sales: f64 = lines.iter().filter(|l| l.country == "Japan").map(|l| l.sales).sum();
    assert!(close(aggregate::kpis(&view).unwrap().total_sales, expected_sales));
}

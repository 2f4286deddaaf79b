//! Formula evaluation through the public workbook API

use pretty_assertions::assert_eq;
use sheetkit::prelude::*;
use sheetkit::FormulaError;

fn calc(formula: &str) -> std::result::Result<String, String> {
    let mut wb = Workbook::new();
    wb.set_cell_formula("Sheet1", "Z1", formula).unwrap();
    wb.calc_cell_value("Sheet1", "Z1").map_err(|e| e.to_string())
}

fn ok(s: &str) -> std::result::Result<String, String> {
    Ok(s.to_string())
}

fn err(s: &str) -> std::result::Result<String, String> {
    Err(s.to_string())
}

#[test]
fn test_function_results() {
    let cases = [
        ("SUM(1,2)", ok("3")),
        ("ABS(-6.5)", ok("6.5")),
        ("SIGN(0.00000001)", ok("1")),
        ("SQRT(4)", ok("2")),
        ("1+SUM(SUM(1,2*3),4)*-4/2+5+(4+2)*3", ok("2")),
        ("GCD(15,10,25)", ok("5")),
        ("LCM(1,8,12)", ok("24")),
        ("POWER(2,10)", ok("1024")),
        ("QUOTIENT(7,2)", ok("3")),
        ("MOD(-3,2)", ok("1")),
        ("INT(2.7)", ok("2")),
        ("AVERAGE(1,2,3,4)", ok("2.5")),
        ("IF(2>1,\"big\",\"small\")", ok("big")),
        ("LEN(\"hello\")&\"!\"", ok("5!")),
        ("2^3^2", ok("64")),
        ("50%", ok("0.5")),
    ];
    for (formula, expected) in cases {
        assert_eq!(calc(formula), expected, "{}", formula);
    }
}

#[test]
fn test_error_results() {
    let cases = [
        ("GCD(-1)", "GCD only accepts positive arguments"),
        ("LCM(-1)", "LCM only accepts positive arguments"),
        ("POWER(0,0)", "#NUM!"),
        ("POWER(0,-1)", "#DIV/0!"),
        ("SQRT(-1)", "#NUM!"),
        ("QUOTIENT(1,0)", "#DIV/0!"),
        ("1/0", "#DIV/0!"),
        ("ABS()", "ABS requires 1 numeric arguments"),
        ("POWER(1)", "POWER requires 2 numeric arguments"),
        ("PRODUCT()", "PRODUCT requires at least 1 argument"),
        ("UNSUPPORT(A1)", "not support UNSUPPORT function"),
        ("Missing!A1", "sheet Missing is not exist"),
        ("#N/A", "#N/A"),
    ];
    for (formula, expected) in cases {
        assert_eq!(calc(formula), err(expected), "{}", formula);
    }
}

#[test]
fn test_cell_references() {
    let mut wb = Workbook::new();
    wb.set_cell_value("Sheet1", "A1", 1.0).unwrap();
    wb.set_cell_value("Sheet1", "A2", 2.0).unwrap();
    wb.set_cell_value("Sheet1", "A3", 3.0).unwrap();
    wb.set_cell_formula("Sheet1", "B1", "SUM(A1:A2)").unwrap();
    wb.set_cell_formula("Sheet1", "B2", "A1/A3").unwrap();
    wb.set_cell_formula("Sheet1", "B3", "=B1+B2*3").unwrap();

    assert_eq!(wb.calc_cell_value("Sheet1", "B1").unwrap(), "3");
    assert_eq!(wb.calc_cell_value("Sheet1", "B2").unwrap(), "0.3333333333333333");
    assert_eq!(wb.calc_cell_value("Sheet1", "B3").unwrap(), "4");
    assert_eq!(wb.calc_cell_value("Sheet1", "A1").unwrap(), "");
}

#[test]
fn test_cross_sheet_formulas() {
    let mut wb = Workbook::new();
    wb.add_worksheet_with_name("Rates Q1").unwrap();
    wb.set_cell_value("Rates Q1", "B2", 0.25).unwrap();
    wb.set_cell_value("Sheet1", "A1", 200.0).unwrap();
    wb.set_cell_formula("Sheet1", "A2", "A1*'Rates Q1'!B2").unwrap();

    assert_eq!(wb.calc_cell_value("Sheet1", "A2").unwrap(), "50");
}

#[test]
fn test_repeated_evaluation_is_deterministic() {
    let mut wb = Workbook::new();
    wb.set_cell_value("Sheet1", "A1", 7.0).unwrap();
    wb.set_cell_formula("Sheet1", "A2", "A1/3+SQRT(A1)").unwrap();

    let first = wb.calc_cell_value("Sheet1", "A2").unwrap();
    for _ in 0..10 {
        assert_eq!(wb.calc_cell_value("Sheet1", "A2").unwrap(), first);
    }
}

#[test]
fn test_cycles_are_reported() {
    let mut wb = Workbook::new();
    wb.set_cell_formula("Sheet1", "A1", "B1+1").unwrap();
    wb.set_cell_formula("Sheet1", "B1", "A1+1").unwrap();

    match wb.calc_cell_value("Sheet1", "A1").unwrap_err() {
        Error::Formula(FormulaError::CircularReference(cell)) => assert_eq!(cell, "Sheet1!A1"),
        other => panic!("expected a circular reference, got {other:?}"),
    }
}

#[test]
fn test_depth_limit_from_options() {
    let mut wb = Workbook::new();
    wb.set_cell_value("Sheet1", "A1", 1.0).unwrap();
    for row in 2..=20 {
        wb.set_cell_formula("Sheet1", &format!("A{}", row), &format!("A{}+1", row - 1))
            .unwrap();
    }

    assert_eq!(wb.calc_cell_value("Sheet1", "A20").unwrap(), "20");

    let shallow = CalculationOptions {
        max_depth: 5,
        ..CalculationOptions::default()
    };
    assert!(matches!(
        wb.calc_cell_value_with_options("Sheet1", "A20", &shallow),
        Err(Error::Formula(FormulaError::DepthExceeded(5)))
    ));
}

#[test]
fn test_shared_formula_cells() {
    let mut wb = Workbook::new();
    for (cell, value) in [("A2", 1.0), ("A3", 2.0), ("A4", 3.0)] {
        wb.set_cell_value("Sheet1", cell, value).unwrap();
    }
    wb.set_shared_formula("Sheet1", "B2:B4", "2*A2").unwrap();
    wb.set_shared_formula("Sheet1", "C2:C4", "2*$A$2+LEN(\"\")").unwrap();

    assert_eq!(wb.get_cell_formula("Sheet1", "B3").unwrap(), "2*A3");
    assert_eq!(wb.calc_cell_value("Sheet1", "B4").unwrap(), "6");
    for cell in ["C2", "C3", "C4"] {
        assert_eq!(wb.get_cell_formula("Sheet1", cell).unwrap(), "2*$A$2+LEN(\"\")");
        assert_eq!(wb.calc_cell_value("Sheet1", cell).unwrap(), "2");
    }
}

//! End-to-end flows: import transaction data, then report lots and gains

mod common;

use predicates::prelude::*;

fn seed_trades(workspace: &common::TestWorkspace) {
    workspace.write_file(
        "trades.csv",
        &format!(
            "{}\n\
trade,b1,2015-01-02,,broker.test,1111,CUSIP,123456789,XYZ,Xylophones,USD,-1000,100,,,,,,,,,,\n\
trade,b2,2016-02-04,,broker.test,1111,CUSIP,123456789,XYZ,Xylophones,USD,-1200,100,,,,,,,,,,\n\
trade,s1,2016-06-01,,broker.test,1111,CUSIP,123456789,XYZ,Xylophones,USD,2250,-150,,,,,,,,,,\n",
            common::TX_HEADER
        ),
    );
    common::capgains_cmd(workspace)
        .args(["import", "trades.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 transaction(s) imported"));
}

#[test]
fn test_import_is_idempotent() {
    let workspace = common::TestWorkspace::new();
    seed_trades(&workspace);
    common::capgains_cmd(&workspace)
        .args(["import", "trades.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 transaction(s) imported"))
        .stdout(predicate::str::contains("3 duplicate(s) skipped"));
}

#[test]
fn test_lots_report_after_partial_close() {
    let workspace = common::TestWorkspace::new();
    seed_trades(&workspace);

    common::capgains_cmd(&workspace)
        .args(["lots", "positions.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 lot row(s)"));

    let report = workspace.read_file("positions.csv");
    let mut lines = report.lines();
    let header = lines.next().expect("header row");
    assert!(header.starts_with("brokerid,acctid,ticker,secname,opendt,opentxid,units,cost"));
    // FIFO: the 2015 lot closed in full, 50 units of the 2016 lot remain
    let row = lines.next().expect("data row");
    assert!(row.contains("broker.test"));
    assert!(row.contains("b2"));
    assert!(row.contains(",50,600,USD"));
    assert!(lines.next().is_none());
}

#[test]
fn test_gains_report_fifo_character() {
    let workspace = common::TestWorkspace::new();
    seed_trades(&workspace);

    common::capgains_cmd(&workspace)
        .args(["gains", "gains.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 gain row(s)"));

    let report = workspace.read_file("gains.csv");
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 3);
    // Lot held > 366 days is long-term; the same-year lot isn't
    assert!(lines[1].contains("b1"));
    assert!(lines[1].contains("1500"));
    assert!(lines[1].contains("1000"));
    assert!(lines[1].contains("true"));
    assert!(lines[2].contains("b2"));
    assert!(lines[2].contains("750"));
    assert!(lines[2].contains("600"));
    assert!(lines[2].contains("false"));
}

#[test]
fn test_gains_report_consolidated() {
    let workspace = common::TestWorkspace::new();
    seed_trades(&workspace);

    common::capgains_cmd(&workspace)
        .args(["gains", "gains.csv", "-c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 gain row(s)"));

    let report = workspace.read_file("gains.csv");
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 2);
    // Consolidated rows drop account and per-lot columns
    assert!(lines[1].starts_with(",,XYZ"));
    assert!(lines[1].contains("150"));
    assert!(lines[1].contains("2250"));
    assert!(lines[1].contains("1600"));
}

#[test]
fn test_gains_report_respects_date_range() {
    let workspace = common::TestWorkspace::new();
    seed_trades(&workspace);

    // Excluding the 2015 buy, the sale closes the 2016 lot and goes short
    common::capgains_cmd(&workspace)
        .args(["gains", "gains.csv", "-s", "2016-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 gain row(s)"));

    let report = workspace.read_file("gains.csv");
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("1500"));
    assert!(lines[1].contains("1200"));
}

#[test]
fn test_gains_against_baseline_lots() {
    let workspace = common::TestWorkspace::new();
    workspace.write_file(
        "baseline.csv",
        "brokerid,acctid,ticker,secname,opendt,opentxid,units,cost,currency,CUSIP,ISIN,CONID,TICKER\n\
broker.test,1111,XYZ,Xylophones,2014-01-01T00:00:00,base-1,200,2000,USD,123456789,,,\n",
    );
    workspace.write_file(
        "sale.csv",
        &format!(
            "{}\n\
trade,s1,2016-06-01,,broker.test,1111,CUSIP,123456789,XYZ,Xylophones,USD,2250,-150,,,,,,,,,,\n",
            common::TX_HEADER
        ),
    );
    common::capgains_cmd(&workspace)
        .args(["import", "sale.csv"])
        .assert()
        .success();

    common::capgains_cmd(&workspace)
        .args(["gains", "gains.csv", "-L", "baseline.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 gain row(s)"));

    let report = workspace.read_file("gains.csv");
    let lines: Vec<&str> = report.lines().collect();
    // 150 units of the baseline close long-term against basis 10/unit
    assert!(lines[1].contains("base-1"));
    assert!(lines[1].contains("2250"));
    assert!(lines[1].contains("1500"));
    assert!(lines[1].contains("true"));

    common::capgains_cmd(&workspace)
        .args(["lots", "positions.csv", "-L", "baseline.csv"])
        .assert()
        .success();
    let positions = workspace.read_file("positions.csv");
    assert!(positions.contains(",50,500,USD"));
}

#[test]
fn test_gains_translate_to_functional_currency() {
    let workspace = common::TestWorkspace::new();
    workspace.write_file(
        "trades.csv",
        &format!(
            "{}\n\
trade,c1,2016-01-04,,broker.test,1111,ISIN,CA0679011084,ABX,Barrick,CAD,-1000,100,,,,,,,,,,\n\
trade,c2,2016-06-01,,broker.test,1111,ISIN,CA0679011084,ABX,Barrick,CAD,1500,-100,,,,,,,,,,\n",
            common::TX_HEADER
        ),
    );
    workspace.write_file(
        "rates.csv",
        "date,fromcurrency,tocurrency,rate\n\
2016-01-04,CAD,USD,0.70\n\
2016-06-01,CAD,USD,0.80\n",
    );
    common::capgains_cmd(&workspace)
        .args(["import", "trades.csv", "rates.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 rate(s) merged"));

    common::capgains_cmd(&workspace)
        .args(["gains", "gains.csv"])
        .assert()
        .success();

    let report = workspace.read_file("gains.csv");
    let lines: Vec<&str> = report.lines().collect();
    // Basis at the purchase-date rate, proceeds at the sale-date rate, USD
    assert!(lines[1].contains("1200.00"));
    assert!(lines[1].contains("700.00"));
    assert!(lines[1].contains("USD"));
}

#[test]
fn test_corporate_actions_flow() {
    let workspace = common::TestWorkspace::new();
    // Buy, 2:1 split, then sell half; basis per share halves with the split
    workspace.write_file(
        "trades.csv",
        &format!(
            "{}\n\
trade,b1,2015-01-02,,broker.test,1111,CUSIP,123456789,XYZ,Xylophones,USD,-1000,100,,,,,,,,,,\n\
split,sp1,2016-02-01,,broker.test,1111,CUSIP,123456789,XYZ,Xylophones,,,100,,,,,,,2,1,,\n\
trade,s1,2016-06-01,,broker.test,1111,CUSIP,123456789,XYZ,Xylophones,USD,900,-100,,,,,,,,,,\n",
            common::TX_HEADER
        ),
    );
    common::capgains_cmd(&workspace)
        .args(["import", "trades.csv"])
        .assert()
        .success();

    common::capgains_cmd(&workspace)
        .args(["gains", "gains.csv"])
        .assert()
        .success();
    let gains = workspace.read_file("gains.csv");
    let lines: Vec<&str> = gains.lines().collect();
    // 100 of 200 post-split shares sold: proceeds 900, basis 500, long-term
    assert!(lines[1].contains("900"));
    assert!(lines[1].contains("500"));
    assert!(lines[1].contains("true"));

    common::capgains_cmd(&workspace)
        .args(["lots", "positions.csv"])
        .assert()
        .success();
    assert!(workspace.read_file("positions.csv").contains(",100,500,USD"));
}

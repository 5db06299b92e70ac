use cost_report::fx::FxTable;
use cost_report::loader::{load_seasons, merge_season_files, season_dir};
use cost_report::output::{write_json, write_records};
use cost_report::reports::{brand_slices, build_item_tables, build_summary, item_table_headers, PeriodContext};
use cost_report::season::Season;
use std::fs;
use std::path::Path;

const HEADER: &str = "브랜드,시즌,스타일,중분류,아이템명,PO,TAG,수량,원가견적번호,발주통화,제조업체,(USD)_원자재,(USD)_아트웍,(USD)_부자재,(USD)_택/라벨,(USD) 공임,(USD)본사공급자재,(USD)_정상마진,(USD)_경비,(KRW)_원자재,(KRW)_아트웍,(KRW)_부자재,(KRW)_택/라벨,(KRW)_공임,(KRW)본사공급자재,(KRW)_정상마진,(KRW)_경비";

fn write_fixture(root: &Path) {
    fs::create_dir_all(root.join("25FW")).unwrap();
    fs::write(
        root.join("FX.csv"),
        "\u{feff}브랜드,시즌,카테고리,환율\nX,24F,의류,1000\nX,23F,의류,1100\nX,24F,슈즈,1250\n",
    )
    .unwrap();
    fs::write(
        root.join("25FW").join("X_25F.csv"),
        format!(
            "{}\n\
             X,25F,DXJP1,Outer,Down,P1,\"110,000\",100,Q1,USD,ACME,20,0,0,0,0,0,2,0,26000,0,0,0,0,0,2600,0\n\
             X,25F,DKJP1,Outer,Down,P2,55000,50,Q2,USD,ACME,10,0,0,0,0,0,1,0,13000,0,0,0,0,0,1300,0\n\
             X,25F,DXSH1,Shoes,Sneakers,P3,125000,0,Q3,USD,ACME,30,0,0,0,0,0,3,0,39000,0,0,0,0,0,3900,0\n",
            HEADER
        ),
    )
    .unwrap();
    fs::write(
        root.join("X_24F.csv"),
        format!(
            "{}\nX,24F,DXJP0,Outer,Down,P0,110000,80,Q0,USD,ACME,15,0,0,0,0,0,1.5,0,20000,0,0,0,0,0,2000,0\n",
            HEADER
        ),
    )
    .unwrap();
}

#[test]
fn summary_for_discovery_slices() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_fixture(root);

    let fx = FxTable::load(&root.join("FX.csv"), 1300.0).unwrap();
    assert_eq!(fx.len(), 3);
    let season = Season::parse("25FW").unwrap();
    let seasons = [season.previous().unwrap(), season];
    let items = load_seasons(root, &seasons, "X").unwrap();
    assert_eq!(items.len(), 4);

    let ctx = PeriodContext::new("X", season, &fx);
    let slices = brand_slices("X");
    let adult = build_summary(&slices[0].select(&items), &ctx);
    let kids = build_summary(&slices[1].select(&items), &ctx);

    // Zero-quantity shoes contribute nothing.
    assert_eq!(adult.total.qty_curr, 100);
    assert_eq!(adult.total.qty_prev, 80);
    // 110,000 KRW at 24F 의류 rate 1000.
    assert_eq!(adult.total.usd.curr.avg_tag, 110.0);
    // 110,000 KRW at 23F 의류 rate 1100.
    assert_eq!(adult.total.usd.prev.avg_tag, 100.0);
    assert_eq!(adult.total.usd.curr.cost_rate, 22.0);
    assert_eq!(adult.total.krw.curr.cost_rate, 28.6);

    assert_eq!(kids.total.qty_curr, 50);
    assert_eq!(kids.total.qty_prev, 0);
    assert_eq!(kids.total.qty_yoy, 0.0);

    let out = season_dir(root, season).join("summary_25fw_x_kids.json");
    write_json(&out, &kids).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["total"]["qty25F"], 50);
    assert_eq!(json["categories"].as_array().unwrap().len(), 1);
}

#[test]
fn item_table_written_with_bom() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_fixture(root);

    let fx = FxTable::load(&root.join("FX.csv"), 1300.0).unwrap();
    let season = Season::parse("25F").unwrap();
    let items = load_seasons(root, &[season.previous().unwrap(), season], "X").unwrap();
    let rows = build_item_tables(&[("X".to_string(), items)], season, &fx);
    // Down, Outer subtotal, Sneakers, Acc_etc subtotal, brand total.
    assert_eq!(rows.len(), 5);

    let out = season_dir(root, season).join("item_cost_rate_25FW.csv");
    let n = write_records(&out, item_table_headers(), rows.iter().map(|r| r.record())).unwrap();
    assert_eq!(n, 5);

    let mut rdr = csv::Reader::from_path(&out).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert!(headers.get(0).unwrap().ends_with("중분류"));
    let last = rdr.records().last().unwrap().unwrap();
    assert_eq!(last.get(1), Some("DISCOVERY"));
}

#[test]
fn merge_writes_all_seasons() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_fixture(root);

    let seasons = [Season::parse("24F").unwrap(), Season::parse("25F").unwrap()];
    let (headers, rows) = merge_season_files(root, &seasons, "X").unwrap();
    assert_eq!(rows.len(), 4);

    let out = root.join("X_ALL.csv");
    write_records(&out, &headers, &rows).unwrap();
    let items = load_seasons(root, &[Season::parse("24F").unwrap()], "X").unwrap();
    assert_eq!(items.len(), 1);
    let merged = cost_report::loader::load_items(&out).unwrap().0;
    assert_eq!(merged.len(), 4);
    assert_eq!(merged[0].season, "24F");
}

//! Behavioural tests for the identity & merge engine.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use utflykt_core::{Place, Provenance, merge_places};

fn provenance(name: &str) -> Provenance {
    Provenance {
        name: name.into(),
        url: "https://example.se".into(),
        license: "CC0".into(),
    }
}

#[fixture]
fn candidates() -> RefCell<Vec<Place>> {
    RefCell::new(Vec::new())
}

#[fixture]
fn merged() -> RefCell<Vec<Place>> {
    RefCell::new(Vec::new())
}

#[given("two candidates sharing a normalised name and link host")]
fn duplicate_candidates(#[from(candidates)] candidates: &RefCell<Vec<Place>>) {
    let mut first = Place::new("a", provenance("OSM"));
    first.name = Some("Tanto Utegym".into());
    first.link = Some("https://www.tanto.se/gym".into());
    first.categories = vec!["gym".into(), "outdoor".into()];

    let mut second = Place::new("b", provenance("Municipal"));
    second.name = Some(" tanto utegym ".into());
    second.link = Some("https://tanto.se/hitta-hit".into());
    second.categories = vec!["gym".into(), "fitness".into()];

    *candidates.borrow_mut() = vec![first, second];
}

#[given("two candidates with neither name nor link")]
fn anonymous_candidates(#[from(candidates)] candidates: &RefCell<Vec<Place>>) {
    *candidates.borrow_mut() = vec![
        Place::new("a", provenance("Crawler")),
        Place::new("b", provenance("Crawler")),
    ];
}

#[when("I merge the candidate stream")]
fn merge_stream(
    #[from(candidates)] candidates: &RefCell<Vec<Place>>,
    #[from(merged)] merged: &RefCell<Vec<Place>>,
) {
    let input = candidates.borrow_mut().drain(..).collect::<Vec<_>>();
    *merged.borrow_mut() = merge_places(input);
}

#[then("one canonical record remains")]
fn one_remains(#[from(merged)] merged: &RefCell<Vec<Place>>) {
    assert_eq!(merged.borrow().len(), 1);
}

#[then("its categories are the sorted union of both inputs")]
fn categories_unioned(#[from(merged)] merged: &RefCell<Vec<Place>>) {
    let merged = merged.borrow();
    assert_eq!(merged[0].categories, vec!["fitness", "gym", "outdoor"]);
}

#[then("two canonical records remain")]
fn two_remain(#[from(merged)] merged: &RefCell<Vec<Place>>) {
    assert_eq!(merged.borrow().len(), 2);
}

#[scenario(path = "tests/features/merge.feature", index = 0)]
fn duplicates_collapse(candidates: RefCell<Vec<Place>>, merged: RefCell<Vec<Place>>) {
    let _ = (candidates, merged);
}

#[scenario(path = "tests/features/merge.feature", index = 1)]
fn anonymous_records_stay_apart(candidates: RefCell<Vec<Place>>, merged: RefCell<Vec<Place>>) {
    let _ = (candidates, merged);
}

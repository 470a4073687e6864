//! Integration tests for `SqliteStore` and the core services against an
//! in-memory database.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use hotspots_core::{
  Error,
  aggregate::FactorAggregator,
  catalog::Catalog,
  clock::ManualClock,
  factor::{FactorEntry, FactorKind, FactorRatings, RatingScale},
  identity::{ADMIN, Identity},
  review::{NewReview, Review, ReviewPatch},
  spot::{NewSpot, Spot, SpotPatch},
  store::{BlobStore, NewBlob, SpotStore},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_spot(name: &str) -> NewSpot {
  NewSpot {
    name:     name.into(),
    address:  "6 MetroTech Center, Brooklyn, NY 11201".into(),
    capacity: "Medium".into(),
    image:    None,
  }
}

fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, d).unwrap() }

fn clock_at_noon(d: u32) -> Arc<ManualClock> {
  Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()))
}

async fn catalog() -> (Catalog<SqliteStore>, Arc<ManualClock>) {
  let clock = clock_at_noon(1);
  let catalog = Catalog::new(Arc::new(store().await), RatingScale::default(), clock.clone());
  (catalog, clock)
}

fn review_input(spot_id: Uuid, rating: u8) -> NewReview {
  NewReview {
    spot_id,
    title: "test_endpoints_unit_test".into(),
    text: "wow what a great app".into(),
    rating,
  }
}

// ─── Spots ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_spot() {
  let s = store().await;
  let spot = Spot::new(new_spot("Bobst Library"), Utc::now());
  s.insert_spot(spot.clone()).await.unwrap();

  let fetched = s.get_spot(spot.spot_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Bobst Library");
  assert_eq!(fetched.capacity, "Medium");
  assert_eq!(fetched.factors, spot.factors);
}

#[tokio::test]
async fn get_spot_missing_returns_none() {
  let s = store().await;
  assert!(s.get_spot(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_name_and_address_is_rejected() {
  let s = store().await;
  s.insert_spot(Spot::new(new_spot("Dibner"), Utc::now())).await.unwrap();
  let err = s
    .insert_spot(Spot::new(new_spot("Dibner"), Utc::now()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Duplicate(_)));
}

#[tokio::test]
async fn list_spots_returns_all_with_factors() {
  let s = store().await;
  s.insert_spot(Spot::new(new_spot("A"), Utc::now())).await.unwrap();
  s.insert_spot(Spot::new(new_spot("B"), Utc::now())).await.unwrap();

  let all = s.list_spots().await.unwrap();
  assert_eq!(all.len(), 2);
  assert!(all.iter().all(|sp| sp.factors.iter().all(|(_, e)| e.sample_count == 0)));
}

#[tokio::test]
async fn update_spot_applies_patch_and_clears_image() {
  let s = store().await;
  let mut input = new_spot("Kimmel");
  input.image = Some("https://example.com/kimmel.png".into());
  let spot = Spot::new(input, Utc::now());
  s.insert_spot(spot.clone()).await.unwrap();

  let later = spot.updated_at + Duration::minutes(5);
  let updated = s
    .update_spot(
      spot.spot_id,
      SpotPatch { capacity: Some("Low".into()), image: Some(String::new()), ..Default::default() },
      later,
    )
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.capacity, "Low");
  assert_eq!(updated.name, "Kimmel");
  assert_eq!(updated.image, None);
  assert_eq!(updated.updated_at, later);
  assert_eq!(updated.created_at, spot.created_at);
}

#[tokio::test]
async fn update_missing_spot_returns_none() {
  let s = store().await;
  let result = s
    .update_spot(Uuid::new_v4(), SpotPatch::default(), Utc::now())
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn delete_spot_cascades_reviews_and_factors() {
  let s = store().await;
  let spot = Spot::new(new_spot("Tandon"), Utc::now());
  s.insert_spot(spot.clone()).await.unwrap();
  let review = Review::new(review_input(spot.spot_id, 4), "alice".into(), Utc::now());
  s.insert_review(review.clone()).await.unwrap();

  let deleted = s.delete_spot(spot.spot_id).await.unwrap();
  assert_eq!(deleted.map(|d| d.spot_id), Some(spot.spot_id));

  assert!(s.get_spot(spot.spot_id).await.unwrap().is_none());
  assert!(s.get_factors(spot.spot_id).await.unwrap().is_none());
  assert!(s.get_review(review.review_id).await.unwrap().is_none());
  assert!(s.list_reviews(spot.spot_id).await.unwrap().is_empty());
  assert!(s.delete_spot(spot.spot_id).await.unwrap().is_none());
}

// ─── Factors ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_factor_touches_only_its_kind() {
  let s = store().await;
  let spot = Spot::new(new_spot("Courant"), Utc::now());
  s.insert_spot(spot.clone()).await.unwrap();

  let noise = FactorEntry { average: 2.0, sample_count: 3, last_date: Some(day(1)) };
  let ambiance = FactorEntry { average: 4.5, sample_count: 2, last_date: Some(day(1)) };
  assert!(s.save_factor(spot.spot_id, FactorKind::Noise, noise).await.unwrap());
  assert!(s.save_factor(spot.spot_id, FactorKind::Ambiance, ambiance).await.unwrap());

  let factors = s.get_factors(spot.spot_id).await.unwrap().unwrap();
  assert_eq!(factors.noise, noise);
  assert_eq!(factors.ambiance, ambiance);
  assert_eq!(factors.availability, FactorEntry::default());
}

#[tokio::test]
async fn save_factor_for_missing_spot_reports_false() {
  let s = store().await;
  let written = s
    .save_factor(Uuid::new_v4(), FactorKind::Noise, FactorEntry::reset(day(1)))
    .await
    .unwrap();
  assert!(!written);
}

#[tokio::test]
async fn reset_factor_clears_only_outdated_rows() {
  let s = store().await;
  let spot = Spot::new(new_spot("Tandon"), Utc::now());
  s.insert_spot(spot.clone()).await.unwrap();

  let yesterday = FactorEntry { average: 2.0, sample_count: 3, last_date: Some(day(1)) };
  let current = FactorEntry { average: 4.0, sample_count: 1, last_date: Some(day(2)) };
  s.save_factor(spot.spot_id, FactorKind::Noise, yesterday).await.unwrap();
  s.save_factor(spot.spot_id, FactorKind::Ambiance, current).await.unwrap();

  let noise = s.reset_factor(spot.spot_id, FactorKind::Noise, day(2)).await.unwrap();
  assert_eq!(noise, Some(FactorEntry::reset(day(2))));
  let ambiance = s.reset_factor(spot.spot_id, FactorKind::Ambiance, day(2)).await.unwrap();
  assert_eq!(ambiance, Some(current));

  let factors = s.get_factors(spot.spot_id).await.unwrap().unwrap();
  assert_eq!(factors.noise, FactorEntry::reset(day(2)));
  assert_eq!(factors.ambiance, current);
}

#[tokio::test]
async fn reset_factor_for_missing_spot_is_none() {
  let s = store().await;
  let id = Uuid::new_v4();
  let entry = s.reset_factor(id, FactorKind::Noise, day(1)).await.unwrap();
  assert!(entry.is_none());
  assert!(s.get_factors(id).await.unwrap().is_none());
}

// ─── Aggregator ──────────────────────────────────────────────────────────────

async fn aggregator_with_spot() -> (FactorAggregator<SqliteStore>, Arc<SqliteStore>, Uuid) {
  let s = Arc::new(store().await);
  let spot = Spot::new(new_spot("Silver Center"), Utc::now());
  let id = spot.spot_id;
  s.insert_spot(spot).await.unwrap();
  (FactorAggregator::new(s.clone(), RatingScale::default()), s, id)
}

#[tokio::test]
async fn same_day_ratings_average_their_clamped_values() {
  let (agg, s, id) = aggregator_with_spot().await;
  let raw = [3.0, 7.0, -1.0, 4.5, 2.0];
  for r in raw {
    agg.submit_factor_rating(id, FactorKind::Availability, r, day(1)).await.unwrap();
  }

  let expected: f64 = raw.iter().map(|r| r.clamp(0.0, 5.0)).sum::<f64>() / raw.len() as f64;
  let entry = s.get_factors(id).await.unwrap().unwrap().availability;
  assert_eq!(entry.sample_count, 5);
  assert!((entry.average - expected).abs() < 1e-9);
  assert_eq!(entry.last_date, Some(day(1)));
}

#[tokio::test]
async fn next_day_rating_discards_previous_day() {
  let (agg, s, id) = aggregator_with_spot().await;
  agg.submit_factor_rating(id, FactorKind::Noise, 1.0, day(1)).await.unwrap();
  agg.submit_factor_rating(id, FactorKind::Noise, 2.0, day(1)).await.unwrap();
  agg.submit_factor_rating(id, FactorKind::Noise, 9.0, day(2)).await.unwrap();

  let entry = s.get_factors(id).await.unwrap().unwrap().noise;
  assert_eq!(entry.sample_count, 1);
  assert_eq!(entry.average, 5.0);
  assert_eq!(entry.last_date, Some(day(2)));
}

#[tokio::test]
async fn omitted_kinds_are_left_untouched() {
  let (agg, s, id) = aggregator_with_spot().await;
  agg
    .submit(
      id,
      &FactorRatings { temperature: Some(3.0), ambiance: Some(4.0), ..Default::default() },
      day(1),
    )
    .await
    .unwrap();

  let factors = s.get_factors(id).await.unwrap().unwrap();
  assert_eq!(factors.temperature.sample_count, 1);
  assert_eq!(factors.ambiance.average, 4.0);
  assert_eq!(factors.availability, FactorEntry::default());
  assert_eq!(factors.noise, FactorEntry::default());
}

#[tokio::test]
async fn submit_to_missing_spot_is_not_found() {
  let (agg, _, _) = aggregator_with_spot().await;
  let missing = Uuid::new_v4();
  let err = agg
    .submit_factor_rating(missing, FactorKind::Noise, 3.0, day(1))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SpotNotFound(id) if id == missing));
}

#[tokio::test]
async fn non_finite_value_fails_before_any_write() {
  let (agg, s, id) = aggregator_with_spot().await;
  let err = agg
    .submit(
      id,
      &FactorRatings { availability: Some(3.0), noise: Some(f64::NAN), ..Default::default() },
      day(1),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Invalid(_)));
  assert_eq!(s.get_factors(id).await.unwrap().unwrap().availability, FactorEntry::default());
}

#[tokio::test]
async fn refresh_persists_reset_for_stale_kinds() {
  let (agg, s, id) = aggregator_with_spot().await;
  agg.submit_factor_rating(id, FactorKind::Ambiance, 4.0, day(1)).await.unwrap();

  let stored = s.get_factors(id).await.unwrap().unwrap();
  let refreshed = agg.refresh(id, stored, day(2)).await.unwrap();
  assert_eq!(refreshed.ambiance, FactorEntry::reset(day(2)));

  let persisted = s.get_factors(id).await.unwrap().unwrap();
  assert_eq!(persisted, refreshed);
}

#[tokio::test]
async fn read_reset_keeps_rating_submitted_after_snapshot() {
  let (agg, s, id) = aggregator_with_spot().await;
  agg.submit_factor_rating(id, FactorKind::Noise, 4.0, day(1)).await.unwrap();

  // The reader looks first, then a day-two rating lands before it refreshes.
  let snapshot = s.get_factors(id).await.unwrap().unwrap();
  agg.submit_factor_rating(id, FactorKind::Noise, 3.0, day(2)).await.unwrap();
  let refreshed = agg.refresh(id, snapshot, day(2)).await.unwrap();

  let expected = FactorEntry { average: 3.0, sample_count: 1, last_date: Some(day(2)) };
  assert_eq!(refreshed.noise, expected);
  let persisted = s.get_factors(id).await.unwrap().unwrap();
  assert_eq!(persisted.noise, expected);
}

// ─── Catalog: spots and factors ──────────────────────────────────────────────

#[tokio::test]
async fn availability_scenario_clamps_and_averages() {
  let (cat, _) = catalog().await;
  let id = cat.create_spot(new_spot("Spot S")).await.unwrap();

  cat
    .submit_factors(id, FactorRatings::single(FactorKind::Availability, 3.0))
    .await
    .unwrap();
  let detail = cat.get_spot(id).await.unwrap();
  assert_eq!(detail.spot.factors.availability.average, 3.0);
  assert_eq!(detail.spot.factors.availability.sample_count, 1);

  cat
    .submit_factors(id, FactorRatings::single(FactorKind::Availability, 7.0))
    .await
    .unwrap();
  let detail = cat.get_spot(id).await.unwrap();
  assert_eq!(detail.spot.factors.availability.average, 4.0);
  assert_eq!(detail.spot.factors.availability.sample_count, 2);
}

#[tokio::test]
async fn reads_on_a_new_day_reset_and_agree() {
  let (cat, clock) = catalog().await;
  let id = cat.create_spot(new_spot("Palladium")).await.unwrap();
  cat
    .submit_factors(id, FactorRatings::single(FactorKind::Noise, 2.0))
    .await
    .unwrap();

  clock.advance(Duration::days(1));

  let first = cat.get_spot(id).await.unwrap().spot.factors;
  let second = cat.get_spot(id).await.unwrap().spot.factors;
  assert_eq!(first, second);
  assert_eq!(first.noise.sample_count, 0);
  assert_eq!(first.noise.average, 0.0);
  assert_eq!(first.noise.last_date, Some(day(2)));

  let listed = cat.list_spots().await.unwrap();
  assert_eq!(listed[0].availability, first.availability);
}

#[tokio::test]
async fn list_spots_returns_summaries() {
  let (cat, _) = catalog().await;
  let id = cat.create_spot(new_spot("Washington Square")).await.unwrap();
  cat
    .submit_factors(id, FactorRatings::single(FactorKind::Availability, 5.0))
    .await
    .unwrap();

  let spots = cat.list_spots().await.unwrap();
  assert_eq!(spots.len(), 1);
  assert_eq!(spots[0].spot_id, id);
  assert_eq!(spots[0].availability.average, 5.0);
}

#[tokio::test]
async fn create_spot_rejects_blank_name() {
  let (cat, _) = catalog().await;
  let err = cat.create_spot(new_spot("  ")).await.unwrap_err();
  assert!(matches!(err, Error::Invalid(_)));
}

#[tokio::test]
async fn deleted_spot_is_not_found_and_leaves_no_reviews() {
  let (cat, _) = catalog().await;
  let alice = Identity::new("alice");
  let id = cat.create_spot(new_spot("Lipton")).await.unwrap();
  let review_id = cat.create_review(&alice, review_input(id, 5)).await.unwrap();

  cat.delete_spot(id).await.unwrap();

  assert!(matches!(cat.get_spot(id).await, Err(Error::SpotNotFound(_))));
  assert!(matches!(cat.list_reviews(id).await, Err(Error::SpotNotFound(_))));
  assert!(matches!(cat.get_review(review_id).await, Err(Error::ReviewNotFound(_))));
  assert!(cat.store().list_reviews(id).await.unwrap().is_empty());
  assert!(matches!(cat.delete_spot(id).await, Err(Error::SpotNotFound(_))));
}

// ─── Catalog: images ─────────────────────────────────────────────────────────

fn png(bytes: &[u8]) -> NewBlob {
  NewBlob { filename: "spot.png".into(), media_type: "image/png".into(), data: bytes.to_vec() }
}

#[tokio::test]
async fn upload_image_sets_reference_and_replaces_previous() {
  let (cat, _) = catalog().await;
  let id = cat.create_spot(new_spot("Bobst")).await.unwrap();

  let first = cat.upload_image(id, png(b"first")).await.unwrap();
  let detail = cat.get_spot(id).await.unwrap();
  assert_eq!(detail.spot.image, Some(format!("/images/{first}")));

  let second = cat.upload_image(id, png(b"second")).await.unwrap();
  assert!(matches!(cat.fetch_image(first).await, Err(Error::ImageNotFound(_))));

  let blob = cat.fetch_image(second).await.unwrap();
  assert_eq!(blob.data, b"second");
  assert_eq!(blob.filename, "spot.png");
  assert_eq!(blob.content_hash.len(), 64);
}

#[tokio::test]
async fn deleting_spot_removes_its_image() {
  let (cat, _) = catalog().await;
  let id = cat.create_spot(new_spot("Bobst")).await.unwrap();
  let blob = cat.upload_image(id, png(b"img")).await.unwrap();

  cat.delete_spot(id).await.unwrap();
  assert!(cat.store().get_blob(blob).await.unwrap().is_none());
}

#[tokio::test]
async fn upload_to_missing_spot_is_not_found() {
  let (cat, _) = catalog().await;
  let err = cat.upload_image(Uuid::new_v4(), png(b"x")).await.unwrap_err();
  assert!(matches!(err, Error::SpotNotFound(_)));
}

#[tokio::test]
async fn spot_input_cannot_claim_another_spots_upload() {
  let (cat, _) = catalog().await;
  let owner = cat.create_spot(new_spot("Bobst")).await.unwrap();
  let other = cat.create_spot(new_spot("Dibner")).await.unwrap();
  let blob = cat.upload_image(owner, png(b"owned")).await.unwrap();
  let path = format!("/images/{blob}");

  let mut input = new_spot("Courant");
  input.image = Some(path.clone());
  assert!(matches!(cat.create_spot(input).await, Err(Error::Invalid(_))));

  let patch = SpotPatch { image: Some(path.clone()), ..Default::default() };
  assert!(matches!(cat.update_spot(other, patch).await, Err(Error::Invalid(_))));
  assert_eq!(cat.get_spot(other).await.unwrap().spot.image, None);

  let clear = SpotPatch { image: Some(String::new()), ..Default::default() };
  cat.update_spot(other, clear).await.unwrap();
  assert_eq!(cat.fetch_image(blob).await.unwrap().data, b"owned");
}

#[tokio::test]
async fn spot_update_may_repeat_its_own_upload() {
  let (cat, _) = catalog().await;
  let id = cat.create_spot(new_spot("Bobst")).await.unwrap();
  let blob = cat.upload_image(id, png(b"img")).await.unwrap();

  let patch = SpotPatch {
    name: Some("Bobst Library".into()),
    image: Some(format!("/images/{blob}")),
    ..Default::default()
  };
  cat.update_spot(id, patch).await.unwrap();
  assert!(cat.fetch_image(blob).await.is_ok());
}

// ─── Catalog: reviews ────────────────────────────────────────────────────────

#[tokio::test]
async fn review_on_missing_spot_is_not_found() {
  let (cat, _) = catalog().await;
  let err = cat
    .create_review(&Identity::new("alice"), review_input(Uuid::new_v4(), 4))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SpotNotFound(_)));
}

#[tokio::test]
async fn review_owner_comes_from_identity() {
  let (cat, _) = catalog().await;
  let spot = cat.create_spot(new_spot("Stern")).await.unwrap();
  let id = cat.create_review(&Identity::new("alice"), review_input(spot, 4)).await.unwrap();
  assert_eq!(cat.get_review(id).await.unwrap().user_id, "alice");
}

#[tokio::test]
async fn ownership_scenario_forbids_others_and_allows_admin() {
  let (cat, _) = catalog().await;
  let alice = Identity::new("alice");
  let bob = Identity::new("bob");
  let admin = Identity::new("root").with_permission(ADMIN);

  let spot = cat.create_spot(new_spot("Bobst")).await.unwrap();
  let id = cat.create_review(&alice, review_input(spot, 5)).await.unwrap();

  let patch = ReviewPatch { text: Some("edited".into()), ..Default::default() };
  let err = cat.update_review(&bob, id, patch.clone()).await.unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));
  assert!(matches!(cat.delete_review(&bob, id).await, Err(Error::Forbidden(_))));

  cat.update_review(&alice, id, patch).await.unwrap();
  assert_eq!(cat.get_review(id).await.unwrap().text, "edited");

  cat.delete_review(&admin, id).await.unwrap();
  assert!(matches!(cat.get_review(id).await, Err(Error::ReviewNotFound(_))));
}

#[tokio::test]
async fn mutating_missing_review_is_not_found_before_forbidden() {
  let (cat, _) = catalog().await;
  let err = cat
    .delete_review(&Identity::new("bob"), Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ReviewNotFound(_)));
}

#[tokio::test]
async fn list_reviews_for_existing_spot_without_reviews_is_empty() {
  let (cat, _) = catalog().await;
  let spot = cat.create_spot(new_spot("Empty")).await.unwrap();
  assert!(cat.list_reviews(spot).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_reviews_newest_first() {
  let (cat, clock) = catalog().await;
  let alice = Identity::new("alice");
  let spot = cat.create_spot(new_spot("Order")).await.unwrap();
  let older = cat.create_review(&alice, review_input(spot, 3)).await.unwrap();
  clock.advance(Duration::minutes(1));
  let newer = cat.create_review(&alice, review_input(spot, 4)).await.unwrap();

  let ids: Vec<_> = cat.list_reviews(spot).await.unwrap().iter().map(|r| r.review_id).collect();
  assert_eq!(ids, vec![newer, older]);
}

#[tokio::test]
async fn review_rating_out_of_range_is_invalid() {
  let (cat, _) = catalog().await;
  let spot = cat.create_spot(new_spot("Range")).await.unwrap();
  let err = cat
    .create_review(&Identity::new("alice"), review_input(spot, 9))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Invalid(_)));
}

#[tokio::test]
async fn empty_factor_submission_is_invalid() {
  let (cat, _) = catalog().await;
  let id = cat.create_spot(new_spot("Blank")).await.unwrap();
  let err = cat.submit_factors(id, FactorRatings::default()).await.unwrap_err();
  assert!(matches!(err, Error::Invalid(_)));
}

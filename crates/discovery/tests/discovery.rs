use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use discovery::{
    client::{Client, ProfileChanges, RegistrationRequest},
    credentials::Credentials,
    database::{Database, Repo},
    geocoding::{Geocoder, GeocodingError},
    memory::MemoryDatabase,
    query::{normalize, QueryDescriptor, RadiusUnit, RawQuery, SortOrder},
    RequestError,
};
use model::{
    business::{Business, BusinessDraft},
    category::Category,
    coordinate::Coordinate,
    review::ReviewDraft,
    video::{Video, VideoDraft},
    WithId,
};
use utility::{geo, id::Id, serde::Patch};

const CENTER: (f64, f64) = (42.4430, -76.5019);

/// Degrees of latitude per mile on the sphere used for distances.
fn degrees_for_miles(miles: f64) -> f64 {
    miles / (geo::EARTH_RADIUS_MILES * std::f64::consts::PI / 180.0)
}

fn north_of_center(miles: f64) -> Coordinate {
    Coordinate::new(CENTER.0 + degrees_for_miles(miles), CENTER.1).unwrap()
}

fn center() -> Coordinate {
    Coordinate::new(CENTER.0, CENTER.1).unwrap()
}

struct FakeGeocoder {
    known: HashMap<String, Coordinate>,
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodingError> {
        self.known
            .get(address)
            .copied()
            .ok_or_else(|| GeocodingError::NoMatch(address.to_owned()))
    }
}

fn client() -> Client<MemoryDatabase> {
    let known = HashMap::from([
        ("415 College Ave, Ithaca".to_owned(), north_of_center(1.0)),
        ("Cornell University".to_owned(), north_of_center(2.0)),
    ]);
    Client::new(
        MemoryDatabase::new(),
        Arc::new(FakeGeocoder { known }),
        Credentials::with_iterations(1_000),
    )
}

async fn seed(
    client: &Client<MemoryDatabase>,
    name: &str,
    category: Category,
    location: Option<Coordinate>,
    age_minutes: i64,
) -> WithId<Business> {
    let created_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
        - Duration::minutes(age_minutes);
    Repo::<Business>::insert(
        &mut client.database.auto(),
        Business {
            name: name.to_owned(),
            category,
            description: None,
            address: None,
            phone: None,
            website: None,
            location,
            created_at,
            updated_at: created_at,
        },
    )
    .await
    .unwrap()
}

async fn seed_video(
    client: &Client<MemoryDatabase>,
    business: &WithId<Business>,
    age_minutes: i64,
) -> WithId<Video> {
    Repo::<Video>::insert(
        &mut client.database.auto(),
        Video {
            business_id: business.id,
            url: format!("https://videos.example/{}/{}", business.content.name, age_minutes),
            title: None,
            caption: None,
            thumbnail_url: None,
            created_at: Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap()
                - Duration::minutes(age_minutes),
        },
    )
    .await
    .unwrap()
}

fn around(radius_miles: f64) -> QueryDescriptor {
    QueryDescriptor {
        center: Some(center()),
        radius_miles,
        ..Default::default()
    }
}

fn names<'a, I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a discovery::assembler::BusinessSummary>,
{
    items
        .into_iter()
        .map(|summary| summary.business.content.content.name.clone())
        .collect()
}

#[test]
fn haversine_reference_distance() {
    let ithaca = Coordinate::new(42.4430, -76.5019).unwrap();
    let cornell = Coordinate::new(42.4534, -76.4735).unwrap();
    assert!((ithaca.distance_miles_to(&cornell) - 1.6165).abs() < 0.01);
}

#[tokio::test]
async fn end_to_end_one_four_ten_miles() {
    let client = client();
    seed(&client, "one", Category::Restaurants, Some(north_of_center(1.0)), 30).await;
    seed(&client, "four", Category::Restaurants, Some(north_of_center(4.0)), 10).await;
    seed(&client, "ten", Category::Restaurants, Some(north_of_center(10.0)), 20).await;

    let page = client.find_businesses(&around(5.0)).await.unwrap();
    // newest first
    assert_eq!(names(&page.items), vec!["four", "one"]);
    assert_eq!(page.total_items, 2);

    let distances: Vec<f64> = page
        .items
        .iter()
        .map(|summary| summary.business.distance_miles.unwrap())
        .collect();
    assert!((distances[0] - 4.0).abs() < 1e-6);
    assert!((distances[1] - 1.0).abs() < 1e-6);

    let by_distance = QueryDescriptor {
        ordering: SortOrder::Distance,
        ..around(5.0)
    };
    let page = client.find_businesses(&by_distance).await.unwrap();
    assert_eq!(names(&page.items), vec!["one", "four"]);
}

#[tokio::test]
async fn boundary_is_inclusive() {
    let client = client();
    let location = north_of_center(3.0);
    seed(&client, "edge", Category::Art, Some(location), 0).await;
    let exact = center().distance_miles_to(&location);

    let page = client.find_businesses(&around(exact)).await.unwrap();
    assert_eq!(page.items.len(), 1);

    let page = client.find_businesses(&around(exact - 1e-9)).await.unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn businesses_without_location_never_match_a_center() {
    let client = client();
    seed(&client, "nowhere", Category::Art, None, 0).await;
    seed(&client, "here", Category::Art, Some(center()), 0).await;

    let query = QueryDescriptor {
        category: Some(Category::Art),
        ..around(24_000.0)
    };
    let page = client.find_businesses(&query).await.unwrap();
    assert_eq!(names(&page.items), vec!["here"]);
}

#[tokio::test]
async fn category_filter_has_no_false_positives() {
    let client = client();
    seed(&client, "diner", Category::Restaurants, Some(center()), 0).await;
    seed(&client, "boutique", Category::Clothing, Some(center()), 1).await;
    seed(&client, "legacy", Category::Legacy("Pet Care".to_owned()), Some(center()), 2).await;

    let query = QueryDescriptor {
        category: Some(Category::Clothing),
        ..around(5.0)
    };
    let page = client.find_businesses(&query).await.unwrap();
    assert!(!page.items.is_empty());
    assert!(page
        .items
        .iter()
        .all(|summary| summary.business.content.content.category == Category::Clothing));
}

#[tokio::test]
async fn no_center_passes_everything_through() {
    let client = client();
    seed(&client, "near", Category::Art, Some(center()), 0).await;
    seed(&client, "far", Category::Art, Some(north_of_center(500.0)), 1).await;
    seed(&client, "unknown", Category::Art, None, 2).await;
    seed(&client, "other", Category::Clothing, None, 3).await;

    let query = QueryDescriptor {
        category: Some(Category::Art),
        limit: 2,
        ..Default::default()
    };
    let page = client.find_businesses(&query).await.unwrap();
    assert_eq!(page.total_items, 3);
    assert_eq!(names(&page.items), vec!["near", "far"]);
    assert!(page
        .items
        .iter()
        .all(|summary| summary.business.distance_miles.is_none()));
}

#[tokio::test]
async fn same_query_same_answer() {
    let client = client();
    for index in 0..10 {
        // identical timestamps force the id tie breaker
        seed(&client, &format!("b{}", index), Category::Art, Some(center()), 0).await;
    }
    let first = client.find_businesses(&around(1.0)).await.unwrap();
    let second = client.find_businesses(&around(1.0)).await.unwrap();
    let ids = |page: &discovery::assembler::Page<discovery::assembler::BusinessSummary>| {
        page.items
            .iter()
            .map(|summary| summary.business.content.id)
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
}

#[tokio::test]
async fn cap_applies_after_sorting_the_full_set() {
    let client = client();
    // inserted so that the oldest and farthest come first
    for index in 0..60 {
        let miles = 0.1 * f64::from(60 - index);
        seed(
            &client,
            &format!("b{:02}", index),
            Category::Restaurants,
            Some(north_of_center(miles)),
            i64::from(60 - index),
        )
        .await;
    }

    let page = client.find_businesses(&around(10.0)).await.unwrap();
    assert_eq!(page.items.len(), 50);
    assert_eq!(page.total_items, 60);
    let expected: Vec<String> = (10..60).rev().map(|index| format!("b{:02}", index)).collect();
    assert_eq!(names(&page.items), expected);

    let by_distance = QueryDescriptor {
        ordering: SortOrder::Distance,
        ..around(10.0)
    };
    let page = client.find_businesses(&by_distance).await.unwrap();
    assert_eq!(page.items.len(), 50);
    assert_eq!(names(&page.items), expected);
    let distances: Vec<f64> = page
        .items
        .iter()
        .map(|summary| summary.business.distance_miles.unwrap())
        .collect();
    assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn hand_built_descriptors_with_zero_paging_still_answer() {
    let client = client();
    seed(&client, "near", Category::Art, Some(north_of_center(1.0)), 1).await;
    seed(&client, "far", Category::Art, Some(north_of_center(2.0)), 2).await;

    let query = QueryDescriptor {
        limit: 0,
        page: 0,
        ..around(5.0)
    };
    let businesses = client.find_businesses(&query).await.unwrap();
    assert_eq!(names(&businesses.items), vec!["near"]);
    assert_eq!(businesses.total_pages, 2);
    assert_eq!(businesses.current_page, 1);

    let videos = client.find_videos(&query).await.unwrap();
    assert!(videos.items.is_empty());
    assert_eq!(videos.total_pages, 0);
}

#[tokio::test]
async fn videos_follow_their_businesses() {
    let client = client();
    let near = seed(&client, "near", Category::Art, Some(north_of_center(1.0)), 0).await;
    let far = seed(&client, "far", Category::Art, Some(north_of_center(8.0)), 0).await;
    let shop = seed(&client, "shop", Category::Clothing, Some(center()), 0).await;
    seed_video(&client, &near, 20).await;
    let newest = seed_video(&client, &near, 5).await;
    seed_video(&client, &far, 1).await;
    seed_video(&client, &shop, 2).await;

    let raw = RawQuery::near(CENTER.0, CENTER.1)
        .with_radius(5.0)
        .with_category("art");
    let query = normalize(&raw, RadiusUnit::Miles).unwrap();
    let page = client.find_videos(&query).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].content.video.id, newest.id);
    assert!(page
        .items
        .iter()
        .all(|video| video.content.business.id == near.id));
    assert!((page.items[0].distance_miles.unwrap() - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn lookups_by_id() {
    let client = client();
    let business = seed(&client, "gallery", Category::Art, None, 0).await;
    let video = seed_video(&client, &business, 0).await;

    let summary = client
        .get_business(&business.id.to_string())
        .await
        .unwrap();
    assert_eq!(summary.videos.len(), 1);
    assert!(summary.business.distance_miles.is_none());

    let found = client.get_video(&video.id.to_string()).await.unwrap();
    assert_eq!(found.business.id, business.id);

    assert!(matches!(
        client.get_business("not-an-id").await,
        Err(RequestError::NotFound)
    ));
    assert!(matches!(
        client.get_video(&Id::<Video>::generate().to_string()).await,
        Err(RequestError::NotFound)
    ));
}

fn registration(email: &str, address: Option<&str>) -> RegistrationRequest {
    RegistrationRequest {
        email: email.to_owned(),
        password: "hunter2hunter2".to_owned(),
        business: BusinessDraft {
            name: "Collegetown Bagels".to_owned(),
            category: "Food & Drink".to_owned(),
            address: address.map(str::to_owned),
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn registration_geocodes_when_possible() {
    let client = client();
    let registered = client
        .register(registration("owner@example.com", Some("415 College Ave, Ithaca")))
        .await
        .unwrap();
    assert!(registered.geocoded);
    assert_eq!(registered.business.content.category, Category::Restaurants);
    assert_eq!(registered.owner.business_id, registered.business.id);

    let page = client.find_businesses(&around(5.0)).await.unwrap();
    assert_eq!(page.items.len(), 1);

    let unresolved = client
        .register(registration("other@example.com", Some("Atlantis")))
        .await
        .unwrap();
    assert!(!unresolved.geocoded);
    assert!(unresolved.business.content.location.is_none());
}

#[tokio::test]
async fn registration_rejects_bad_input() {
    let client = client();
    client
        .register(registration("owner@example.com", None))
        .await
        .unwrap();

    assert!(matches!(
        client.register(registration("OWNER@example.com", None)).await,
        Err(RequestError::Conflict(_))
    ));

    let mut short = registration("short@example.com", None);
    short.password = "abc".to_owned();
    assert!(matches!(
        client.register(short).await,
        Err(RequestError::Validation(_))
    ));

    let mut unknown = registration("unknown@example.com", None);
    unknown.business.category = "Pet Care".to_owned();
    assert!(matches!(
        client.register(unknown).await,
        Err(RequestError::UnknownCategory(_))
    ));

    // nothing half-written by the failed attempts
    let page = client
        .find_businesses(&QueryDescriptor::default())
        .await
        .unwrap();
    assert_eq!(page.total_items, 1);
}

#[tokio::test]
async fn login_checks_the_password() {
    let client = client();
    let registered = client
        .register(registration("owner@example.com", None))
        .await
        .unwrap();

    let identity = client
        .login(" Owner@Example.com", "hunter2hunter2")
        .await
        .unwrap();
    assert_eq!(identity, registered.owner);

    let wrong = client.login("owner@example.com", "nope").await;
    let unknown = client.login("nobody@example.com", "hunter2hunter2").await;
    match (wrong, unknown) {
        (Err(RequestError::Unauthorized(a)), Err(RequestError::Unauthorized(b))) => {
            assert_eq!(a, b)
        }
        other => panic!("expected two unauthorized errors, got {:?}", other),
    }
}

#[tokio::test]
async fn profile_updates_geocode_only_changed_addresses() {
    let client = client();
    let registered = client
        .register(registration("owner@example.com", Some("415 College Ave, Ithaca")))
        .await
        .unwrap();
    let identity = registered.owner;

    let update = client
        .update_profile(
            &identity,
            ProfileChanges {
                description: Patch::Set("Bagels".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(update.geocoded);
    assert_eq!(update.business.content.location, Some(north_of_center(1.0)));

    let update = client
        .update_profile(
            &identity,
            ProfileChanges {
                address: Patch::Set("Cornell University".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(update.geocoded);
    assert_eq!(update.business.content.location, Some(north_of_center(2.0)));

    let update = client
        .update_profile(
            &identity,
            ProfileChanges {
                address: Patch::Set("Atlantis".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!update.geocoded);
    assert!(update.business.content.location.is_none());
    assert_eq!(update.business.content.description.as_deref(), Some("Bagels"));
}

#[tokio::test]
async fn videos_belong_to_their_owner() {
    let client = client();
    let alice = client
        .register(registration("alice@example.com", None))
        .await
        .unwrap()
        .owner;
    let bob = client
        .register(registration("bob@example.com", None))
        .await
        .unwrap()
        .owner;

    let video = client
        .create_video(
            &alice,
            VideoDraft {
                url: "https://videos.example/alice.mp4".to_owned(),
                title: Some("Hello".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(client.owner_videos(&alice).await.unwrap().len(), 1);
    assert!(client.owner_videos(&bob).await.unwrap().is_empty());

    assert!(matches!(
        client.delete_video(&bob, &video.id.to_string()).await,
        Err(RequestError::Forbidden)
    ));
    assert!(matches!(
        client.delete_video(&alice, "garbage").await,
        Err(RequestError::NotFound)
    ));
    client
        .delete_video(&alice, &video.id.to_string())
        .await
        .unwrap();
    assert!(client.owner_videos(&alice).await.unwrap().is_empty());

    assert!(matches!(
        client
            .create_video(
                &alice,
                VideoDraft {
                    url: "ftp://videos.example/x".to_owned(),
                    ..Default::default()
                }
            )
            .await,
        Err(RequestError::Validation(_))
    ));
}

#[tokio::test]
async fn reviews_are_validated() {
    let client = client();
    let business = seed(&client, "diner", Category::Restaurants, None, 0).await;
    let id = business.id.to_string();

    for rating in [0, 6, -1] {
        assert!(matches!(
            client
                .add_review(&id, ReviewDraft { rating, comment: String::new() })
                .await,
            Err(RequestError::Validation(_))
        ));
    }
    assert!(matches!(
        client
            .add_review(
                &id,
                ReviewDraft {
                    rating: 3,
                    comment: "x".repeat(1001)
                }
            )
            .await,
        Err(RequestError::Validation(_))
    ));
    assert!(matches!(
        client
            .add_review(
                &Id::<Business>::generate().to_string(),
                ReviewDraft { rating: 3, comment: String::new() }
            )
            .await,
        Err(RequestError::NotFound)
    ));

    client
        .add_review(&id, ReviewDraft { rating: 5, comment: "great".to_owned() })
        .await
        .unwrap();
    client
        .add_review(&id, ReviewDraft { rating: 2, comment: "meh".to_owned() })
        .await
        .unwrap();
    assert_eq!(client.get_reviews(&id).await.unwrap().len(), 2);

    let summary = client.get_business(&id).await.unwrap();
    assert_eq!(summary.rating.review_count, 2);
    assert_eq!(summary.rating.average_rating, Some(3.5));
}

#[tokio::test]
async fn transactions_are_isolated_per_handle() {
    let client = client();
    let transaction = client.database.transaction().await.unwrap();
    drop(transaction);
    let page = client
        .find_businesses(&QueryDescriptor::default())
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

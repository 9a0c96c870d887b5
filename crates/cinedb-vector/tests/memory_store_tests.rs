use cinedb_core::error::Error;
use cinedb_core::filter::{build, FilterPredicate};
use cinedb_core::schema::CollectionSchema;
use cinedb_core::traits::DocumentStore;
use cinedb_core::types::{Document, FieldSelection, FieldValue, Fields};
use cinedb_vector::MemoryStore;

fn movie(title: &str, year: i64, rating: f64, vector: Vec<f32>) -> Document {
    let mut fields = Fields::new();
    fields.insert("Series_Title".into(), title.into());
    fields.insert("Released_Year".into(), year.into());
    fields.insert("IMDB_Rating".into(), rating.into());
    fields.insert("Overview".into(), format!("overview of {title}").into());
    Document::new("", fields).with_vector("Overview_embedding", vector)
}

async fn seeded() -> anyhow::Result<MemoryStore> {
    let store = MemoryStore::new(CollectionSchema::movies(3));
    store.upsert("a", &movie("Alien", 1979, 8.4, vec![1.0, 0.0, 0.0])).await?;
    store.upsert("b", &movie("Aliens", 1986, 8.3, vec![0.9, 0.1, 0.0])).await?;
    store.upsert("c", &movie("Heat", 1995, 8.3, vec![0.0, 1.0, 0.0])).await?;
    store.upsert("d", &movie("Inception", 2010, 8.8, vec![0.0, 0.0, 1.0])).await?;
    store.upsert("e", &movie("Rocky", 1976, 7.5, vec![0.7, 0.7, 0.0])).await?;
    Ok(store)
}

fn title(doc: &Document) -> &str { doc.get("Series_Title").and_then(FieldValue::as_str).unwrap_or_default() }

#[tokio::test]
async fn nearest_first_with_non_increasing_scores() -> anyhow::Result<()> {
    let store = seeded().await?;
    let hits = store.hybrid_search(&[1.0, 0.0, 0.0], &FilterPredicate::match_all(), 3, &FieldSelection::All).await?;
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].document.id, "a");
    assert_eq!(hits[1].document.id, "b");
    for w in hits.windows(2) { assert!(w[0].score >= w[1].score); }
    assert!(hits.iter().all(|h| h.score >= 0.0));
    assert!(hits[0].document.vectors.is_empty());
    Ok(())
}

#[tokio::test]
async fn filter_applies_before_k() -> anyhow::Result<()> {
    let store = seeded().await?;
    // Alien and Aliens are nearest but fall outside the year range.
    let predicate = build(Some((1990, 2024)), Some(7.5), None);
    let hits = store.hybrid_search(&[1.0, 0.0, 0.0], &predicate, 2, &FieldSelection::All).await?;
    let titles: Vec<&str> = hits.iter().map(|h| title(&h.document)).collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"Heat") && titles.contains(&"Inception"));
    Ok(())
}

#[tokio::test]
async fn rating_bound_is_exclusive() -> anyhow::Result<()> {
    let store = seeded().await?;
    let hits = store.hybrid_search(&[0.7, 0.7, 0.0], &build(None, Some(7.5), None), 5, &FieldSelection::All).await?;
    assert!(hits.iter().all(|h| title(&h.document) != "Rocky"));
    assert_eq!(hits.len(), 4);
    Ok(())
}

#[tokio::test]
async fn title_phrase_and_projection() -> anyhow::Result<()> {
    let store = seeded().await?;
    let fields = FieldSelection::only(["Series_Title"]);
    let hits = store.hybrid_search(&[0.0, 0.0, 1.0], &build(None, None, Some("aliens")), 5, &fields).await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(title(&hits[0].document), "Aliens");
    assert_eq!(hits[0].document.fields.len(), 1);
    Ok(())
}

#[tokio::test]
async fn unmatched_filter_is_empty_not_error() -> anyhow::Result<()> {
    let store = seeded().await?;
    let hits = store.hybrid_search(&[1.0, 0.0, 0.0], &build(Some((2030, 2040)), None, None), 5, &FieldSelection::All).await?;
    assert!(hits.is_empty());
    Ok(())
}

#[tokio::test]
async fn upsert_replaces_same_id() -> anyhow::Result<()> {
    let store = seeded().await?;
    store.upsert("c", &movie("Heat (1995)", 1995, 8.3, vec![0.0, 1.0, 0.0])).await?;
    assert_eq!(store.len().await, 5);
    let doc = store.get("c").await.expect("stored");
    assert_eq!(title(&doc), "Heat (1995)");
    assert_eq!(doc.id, "c");
    Ok(())
}

#[tokio::test]
async fn dimension_and_k_errors() -> anyhow::Result<()> {
    let store = seeded().await?;
    let bad = store.upsert("x", &movie("Short", 2000, 7.0, vec![1.0, 0.0])).await;
    assert!(matches!(bad, Err(Error::StoreWrite(_))));
    let q = store.hybrid_search(&[1.0, 0.0], &FilterPredicate::match_all(), 1, &FieldSelection::All).await;
    assert!(matches!(q, Err(Error::StoreQuery(_))));
    let k0 = store.hybrid_search(&[1.0, 0.0, 0.0], &FilterPredicate::match_all(), 0, &FieldSelection::All).await;
    assert!(matches!(k0, Err(Error::InvalidArgument(_))));
    Ok(())
}

#[tokio::test]
async fn non_finite_bounds_are_invalid() -> anyhow::Result<()> {
    let store = seeded().await?;
    for bad in [f64::NAN, f64::INFINITY] {
        let res = store.hybrid_search(&[1.0, 0.0, 0.0], &build(None, Some(bad), None), 3, &FieldSelection::All).await;
        assert!(matches!(res, Err(Error::InvalidArgument(_))), "min_rating={bad}");
    }
    Ok(())
}

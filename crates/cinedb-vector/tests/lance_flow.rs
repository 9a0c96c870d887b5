use cinedb_core::error::Error;
use cinedb_core::filter::{build, Clause, FilterPredicate, NumericRange};
use cinedb_core::schema::CollectionSchema;
use cinedb_core::traits::DocumentStore;
use cinedb_core::types::{Document, FieldSelection, FieldValue, Fields};
use cinedb_vector::{LanceStore, MemoryStore};

fn movie(title: &str, year: i64, rating: f64, vector: Vec<f32>) -> Document {
    let mut fields = Fields::new();
    fields.insert("Series_Title".into(), title.into());
    fields.insert("Released_Year".into(), year.into());
    fields.insert("IMDB_Rating".into(), rating.into());
    Document::new("", fields).with_vector("Overview_embedding", vector)
}

#[tokio::test]
async fn lance_upsert_and_filtered_search() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let uri = tmp.path().to_string_lossy().to_string();
    let store = LanceStore::open(&uri, "movies_test", CollectionSchema::movies(4)).await?;
    assert_eq!(store.count_rows().await?, 0);

    store.upsert("m1", &movie("The Matrix", 1999, 8.7, vec![1.0, 0.0, 0.0, 0.0])).await?;
    store.upsert("m2", &movie("Blade Runner", 1982, 8.1, vec![0.9, 0.1, 0.0, 0.0])).await?;
    store.upsert("m3", &movie("Heat", 1995, 8.3, vec![0.0, 1.0, 0.0, 0.0])).await?;
    store.upsert("m4", &movie("Grown Ups", 2010, 6.0, vec![0.0, 0.0, 1.0, 0.0])).await?;
    assert_eq!(store.count_rows().await?, 4);

    // same id again replaces the row
    store.upsert("m3", &movie("Heat", 1995, 8.3, vec![0.0, 1.0, 0.0, 0.0])).await?;
    assert_eq!(store.count_rows().await?, 4);

    let all = store.hybrid_search(&[1.0, 0.0, 0.0, 0.0], &FilterPredicate::match_all(), 2, &FieldSelection::All).await?;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].document.id, "m1");
    assert!(all[0].score >= all[1].score && all[1].score >= 0.0);
    assert_eq!(all[0].document.get("Certificate"), Some(&FieldValue::Text("NA".into())));

    let predicate = build(Some((1990, 2024)), Some(7.5), None);
    let hits = store.hybrid_search(&[1.0, 0.0, 0.0, 0.0], &predicate, 5, &FieldSelection::only(["Series_Title"])).await?;
    let ids: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m3"]);
    assert_eq!(hits[0].document.fields.len(), 1);

    let phrase = store.hybrid_search(&[0.0, 1.0, 0.0, 0.0], &build(None, None, Some("blade")), 5, &FieldSelection::All).await?;
    assert_eq!(phrase.len(), 1);
    assert_eq!(phrase[0].document.id, "m2");

    let none = store.hybrid_search(&[1.0, 0.0, 0.0, 0.0], &build(Some((2050, 2060)), None, None), 5, &FieldSelection::All).await?;
    assert!(none.is_empty());
    Ok(())
}

#[tokio::test]
async fn lance_reopen_keeps_rows() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let uri = tmp.path().to_string_lossy().to_string();
    {
        let store = LanceStore::open(&uri, "movies", CollectionSchema::movies(2)).await?;
        store.upsert("x", &movie("Up", 2009, 8.2, vec![0.6, 0.8])).await?;
    }
    let store = LanceStore::open(&uri, "movies", CollectionSchema::movies(2)).await?;
    assert_eq!(store.count_rows().await?, 1);
    Ok(())
}

async fn ids_for(store: &dyn DocumentStore, predicate: &FilterPredicate) -> anyhow::Result<Vec<String>> {
    let hits = store.hybrid_search(&[1.0, 0.0, 0.0, 0.0], predicate, 10, &FieldSelection::only(["Series_Title"])).await?;
    let mut ids: Vec<String> = hits.into_iter().map(|h| h.document.id).collect();
    ids.sort();
    Ok(ids)
}

#[tokio::test]
async fn title_phrases_match_whole_words_in_both_stores() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let uri = tmp.path().to_string_lossy().to_string();
    let lance = LanceStore::open(&uri, "titles", CollectionSchema::movies(4)).await?;
    let memory = MemoryStore::new(CollectionSchema::movies(4));
    let titles = [
        ("s1", "Spider-Man: No Way Home"),
        ("d1", "The Dark Knight"),
        ("d2", "The Dark Knightly Tale"),
        ("d3", "DARK KNIGHT rises"),
    ];
    for (i, (id, title)) in titles.iter().enumerate() {
        let doc = movie(title, 2000 + i as i64, 8.0, vec![1.0, i as f32, 0.0, 0.0]);
        lance.upsert(id, &doc).await?;
        memory.upsert(id, &doc).await?;
    }

    let cases: [(&str, &[&str]); 5] = [
        ("spider man", &["s1"]),
        ("Spider-Man: no way", &["s1"]),
        ("dark  knight", &["d1", "d3"]),
        ("knight", &["d1", "d3"]),
        ("dark knightly", &["d2"]),
    ];
    for (phrase, expected) in cases {
        let predicate = build(None, None, Some(phrase));
        assert_eq!(ids_for(&lance, &predicate).await?, expected, "lance: {phrase}");
        assert_eq!(ids_for(&memory, &predicate).await?, expected, "memory: {phrase}");
    }
    assert!(ids_for(&lance, &build(None, None, Some("man spider"))).await?.is_empty());
    assert!(ids_for(&lance, &build(None, None, Some("spid"))).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn range_on_text_column_is_empty_not_an_error() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let uri = tmp.path().to_string_lossy().to_string();
    let lance = LanceStore::open(&uri, "movies", CollectionSchema::movies(4)).await?;
    let memory = MemoryStore::new(CollectionSchema::movies(4));
    let doc = movie("Heat", 1995, 8.3, vec![0.0, 1.0, 0.0, 0.0]);
    lance.upsert("m3", &doc).await?;
    memory.upsert("m3", &doc).await?;

    for field in ["Series_Title", "Budget"] {
        let predicate = FilterPredicate::match_all().and(Clause::NumericRange(NumericRange {
            field: field.into(), min: Some(0.0), max: None, inclusive_min: true, inclusive_max: true,
        }));
        assert!(ids_for(&lance, &predicate).await?.is_empty(), "lance: {field}");
        assert!(ids_for(&memory, &predicate).await?.is_empty(), "memory: {field}");
    }

    let nan = build(None, Some(f64::NAN), None);
    let res = lance.hybrid_search(&[1.0, 0.0, 0.0, 0.0], &nan, 3, &FieldSelection::All).await;
    assert!(matches!(res, Err(Error::InvalidArgument(_))));
    Ok(())
}

#[tokio::test]
async fn concurrent_upserts_all_land() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let uri = tmp.path().to_string_lossy().to_string();
    let store = LanceStore::open(&uri, "movies", CollectionSchema::movies(4)).await?;

    let docs: Vec<(String, Document)> = (0..8)
        .map(|i| (format!("c{i}"), movie(&format!("Movie {i}"), 1990 + i, 7.0, vec![1.0, i as f32, 0.0, 0.0])))
        .collect();
    let writes = docs.iter().map(|(id, doc)| store.upsert(id, doc));
    for res in futures::future::join_all(writes).await {
        res?;
    }
    assert_eq!(store.count_rows().await?, 8);
    Ok(())
}

use crate::{
    batch,
    error::{EtlError, Result},
    model::WeatherObservation,
    store::WeatherStore,
};

/// Insert observations one statement at a time, in order.
///
/// The first failed INSERT stops the run; earlier rows stay written.
pub async fn insert_weather(
    store: &dyn WeatherStore,
    observations: &[WeatherObservation],
) -> Result<usize> {
    for (index, observation) in observations.iter().enumerate() {
        store
            .insert(observation)
            .await
            .map_err(|source| EtlError::Write {
                index,
                city: observation.city.clone(),
                source,
            })?;
        tracing::debug!(
            city = %observation.city,
            date = %observation.date,
            "inserted weather row"
        );
    }

    tracing::info!(rows = observations.len(), "weather data insertion completed");
    Ok(observations.len())
}

/// Validate a serialized observation batch, then insert it.
pub async fn insert_weather_document(store: &dyn WeatherStore, document: &str) -> Result<usize> {
    let observations = batch::decode_observations(document)?;
    insert_weather(store, &observations).await
}

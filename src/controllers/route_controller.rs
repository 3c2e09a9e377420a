use crate::dto::planning_dto::RouteResponse;
use crate::repositories::route_repository::RouteRepository;
use crate::utils::errors::{not_found_error, AppResult};
use sqlx::PgPool;
use uuid::Uuid;

pub struct RouteController {
    repository: RouteRepository,
}

impl RouteController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: RouteRepository::new(pool),
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<RouteResponse> {
        let route = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Route", &id.to_string()))?;

        Ok(RouteResponse::from_route(route))
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<RouteResponse>> {
        let routes = self.repository.find_all_by_user(user_id).await?;

        Ok(routes.into_iter().map(RouteResponse::from_route).collect())
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.repository.delete(id, user_id).await?;
        Ok(())
    }
}

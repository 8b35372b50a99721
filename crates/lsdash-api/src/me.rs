// Profile, term and enrollment endpoints

use serde_json::{Map, Value};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{ApiEnrollment, ApiTerm, CoursesResponse, MeResponse, TermsResponse};

impl ApiClient {
    /// Fetch the signed-in user's profile.
    ///
    /// `GET /me`
    pub async fn get_me(&self) -> Result<Map<String, Value>, Error> {
        let url = self.api_url("/me")?;
        debug!("fetching profile");
        let resp: MeResponse = self.get(url).await?;
        Ok(resp.me)
    }

    /// List the user's terms.
    ///
    /// `GET /me/terms`
    pub async fn list_terms(&self) -> Result<Vec<ApiTerm>, Error> {
        let url = self.api_url("/me/terms")?;
        debug!("listing terms");
        let resp: TermsResponse = self.get(url).await?;
        Ok(resp.terms)
    }

    /// List enrollments whose dates fall inside the given ranges.
    ///
    /// `GET /me/courses?expand=course&startDatesBetween={a,b}&endDatesBetween={c,d}`
    ///
    /// Ranges are `MM/dd/yyyy,MM/dd/yyyy` pairs.
    pub async fn list_courses(
        &self,
        start_dates_between: &str,
        end_dates_between: &str,
    ) -> Result<Vec<ApiEnrollment>, Error> {
        let mut url = self.api_url("/me/courses")?;
        url.query_pairs_mut()
            .append_pair("expand", "course")
            .append_pair("startDatesBetween", start_dates_between)
            .append_pair("endDatesBetween", end_dates_between);
        debug!(start_dates_between, end_dates_between, "listing courses");
        let resp: CoursesResponse = self.get(url).await?;
        Ok(resp.courses)
    }
}

// Activity feed and upcoming events

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{ApiHappening, ApiUpcomingEvent, UpcomingEventsResponse, WhatsHappeningResponse};

impl ApiClient {
    /// Activity stream items posted after `after` (`yyyy-MM-ddTHH:mm:ssZ`).
    ///
    /// `GET /me/whatshappeningfeed?v=2&after={after}`
    pub async fn whats_happening(&self, after: &str) -> Result<Vec<ApiHappening>, Error> {
        let mut url = self.api_url("/me/whatshappeningfeed")?;
        url.query_pairs_mut()
            .append_pair("v", "2")
            .append_pair("after", after);
        debug!(after, "fetching activity feed");
        let resp: WhatsHappeningResponse = self.get(url).await?;
        Ok(resp.activity_stream.items)
    }

    /// Upcoming events with their schedules expanded.
    ///
    /// `GET /me/upcomingEvents?expand=schedule[&since={since}]&until={until}`
    ///
    /// Both bounds are `MM/dd/yyyy`.
    pub async fn upcoming_events(
        &self,
        since: Option<&str>,
        until: &str,
    ) -> Result<Vec<ApiUpcomingEvent>, Error> {
        let mut url = self.api_url("/me/upcomingEvents")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("expand", "schedule");
            if let Some(since) = since {
                query.append_pair("since", since);
            }
            query.append_pair("until", until);
        }
        debug!(?since, until, "fetching upcoming events");
        let resp: UpcomingEventsResponse = self.get(url).await?;
        Ok(resp.upcoming_events)
    }
}

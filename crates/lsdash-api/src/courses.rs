// Per-course endpoints: time zone, grade to date, announcements

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{
    AnnouncementsResponse, ApiAnnouncement, ApiGradeToDate, ApiTimeZone, GradeToDateResponse,
    ReadStatus, ReadStatusRequest, TimeZoneResponse,
};

impl ApiClient {
    /// Get the time zone a course is configured in.
    ///
    /// `GET /me/courses/{course_id}/timeZone`
    pub async fn get_time_zone(&self, course_id: &str) -> Result<ApiTimeZone, Error> {
        let url = self.api_url(&format!("/me/courses/{course_id}/timeZone"))?;
        debug!(course_id, "fetching course time zone");
        let resp: TimeZoneResponse = self.get(url).await?;
        Ok(resp.time_zone)
    }

    /// Get the running grade for a course.
    ///
    /// `GET /me/courses/{course_id}/courseGradeToDate`
    pub async fn get_grade_to_date(&self, course_id: &str) -> Result<ApiGradeToDate, Error> {
        let url = self.api_url(&format!("/me/courses/{course_id}/courseGradeToDate"))?;
        debug!(course_id, "fetching grade to date");
        let resp: GradeToDateResponse = self.get(url).await?;
        Ok(resp.course_grade_to_date)
    }

    /// List active announcements for a course.
    ///
    /// `GET /me/courses/{course_id}/announcements?excludeInactive=true`
    pub async fn list_announcements(&self, course_id: &str) -> Result<Vec<ApiAnnouncement>, Error> {
        let mut url = self.api_url(&format!("/me/courses/{course_id}/announcements"))?;
        url.query_pairs_mut().append_pair("excludeInactive", "true");
        debug!(course_id, "listing announcements");
        let resp: AnnouncementsResponse = self.get(url).await?;
        Ok(resp.announcements)
    }

    /// Mark an announcement as read.
    ///
    /// `PUT /me/courses/{course_id}/announcements/{announcement_id}/readstatus`
    /// with `{"announcementReadStatus": {"markedAsRead": true}}`
    pub async fn mark_announcement_read(
        &self,
        course_id: &str,
        announcement_id: &str,
    ) -> Result<(), Error> {
        let url = self.api_url(&format!(
            "/me/courses/{course_id}/announcements/{announcement_id}/readstatus"
        ))?;
        debug!(course_id, announcement_id, "marking announcement read");
        let body = ReadStatusRequest {
            announcement_read_status: ReadStatus {
                marked_as_read: true,
            },
        };
        let _: serde_json::Value = self.put(url, &body).await?;
        Ok(())
    }
}

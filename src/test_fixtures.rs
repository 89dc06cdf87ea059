// Small on-disk dataset shared by the ETL, store and dashboard tests

use crate::config::{DatasetLayout, EtlSettings, GraphSettings, NullPolicy};
use crate::dashboard::Dashboard;
use crate::etl::run_etl;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const FIXTURE_SHARDS: usize = 2;

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// Datasets/ plus an empty cache/ directory under `root`
pub fn write_dataset(root: &Path) -> DatasetLayout {
    let layout = DatasetLayout::new(root.join("Datasets"), root.join("cache"));

    write(
        &layout.status_log_shard(1),
        "timestamp,currentLocation,participantId,currentMode,jobId\n\
         2022-03-01T00:00:00Z,POINT (10 20),0,AtHome,12\n\
         2022-03-01T00:05:00Z,POINT (11 21),1,Transport,\n",
    );
    write(
        &layout.status_log_shard(2),
        "timestamp,currentLocation,participantId,currentMode,jobId\n\
         2022-03-01T00:10:00Z,POINT (12 22),2,AtWork,7\n",
    );

    let attributes = layout.datasets_dir.join("Attributes");
    write(
        &attributes.join("Participants.csv"),
        "participantId,householdSize,haveKids,age,educationLevel,interestGroup,joviality\n\
         0,3,TRUE,36,HighSchoolOrCollege,H,0.001627\n\
         1,3,TRUE,25,HighSchoolOrCollege,B,0.328087\n\
         2,1,FALSE,33,Low,A,0.393470\n\
         3,2,FALSE,45,Bachelors,E,0.851454\n\
         4,1,FALSE,19,Graduate,C,0.5\n",
    );
    write(
        &attributes.join("Jobs.csv"),
        "jobId,employerId,hourlyRate,startTime,endTime,daysToWork,educationRequirement\n\
         0,379,10.0,7:46:00 AM,3:00:00 PM,\"[Monday,Tuesday]\",HighSchoolOrCollege\n\
         1,379,22.2,7:31:00 AM,3:30:00 PM,\"[Monday]\",Bachelors\n\
         2,380,10.0,8:00:00 AM,4:00:00 PM,\"[Friday]\",HighSchoolOrCollege\n",
    );
    write(
        &attributes.join("Apartments.csv"),
        "apartmentId,rentalCost,maxOccupancy,numberOfRooms,location,buildingId\n\
         0,875.0,3,1,POINT (660.5 1176.0),1\n\
         1,525.0,3,1,POINT (-1.5 2.25),1\n",
    );
    write(
        &attributes.join("Pubs.csv"),
        "pubId,hourlyCost,maxOccupancy,location,buildingId\n\
         442,8.2,64,POINT (12.5 7.25),44\n",
    );
    write(
        &attributes.join("Restaurants.csv"),
        "restaurantId,foodCost,maxOccupancy,location,buildingId\n\
         445,5.0,48,POINT (100 200),22\n",
    );
    write(
        &attributes.join("Schools.csv"),
        "schoolId,monthlyCost,maxEnrollment,location,buildingId\n\
         450,12.8,242,POINT (0 4000),7\n",
    );

    let journals = layout.datasets_dir.join("Journals");
    write(
        &journals.join("FinancialJournal.csv"),
        "participantId,timestamp,category,amount\n\
         0,2022-03-01T00:00:00Z,Wage,2472.5\n\
         0,2022-03-01T12:00:00Z,Food,-12.0\n\
         1,2022-03-02T00:00:00Z,Wage,1800.0\n\
         9,2022-03-02T00:00:00Z,Wage,100.0\n",
    );
    write(
        &journals.join("SocialNetwork.csv"),
        "timestamp,participantIdFrom,participantIdTo\n\
         2022-03-01T08:00:00Z,0,1\n\
         2022-03-01T23:00:00Z,0,1\n\
         2022-03-02T00:00:01Z,1,2\n",
    );

    layout
}

pub fn fixture_settings() -> EtlSettings {
    EtlSettings {
        status_log_shards: FIXTURE_SHARDS,
        null_policy: NullPolicy::Drop,
    }
}

/// Fixture edges are light; accept any weight so the graph is not empty
pub fn fixture_graph() -> GraphSettings {
    GraphSettings {
        top_participants: 10,
        min_edge_weight: 0,
    }
}

/// Run the ETL over the fixture and load the dashboard from its snapshots
pub fn fixture_dashboard() -> (TempDir, Dashboard) {
    let dir = TempDir::new().unwrap();
    let layout = write_dataset(dir.path());
    run_etl(&layout, &fixture_settings()).unwrap();
    let dashboard = Dashboard::load(&layout, fixture_graph()).unwrap();
    (dir, dashboard)
}
